pub mod job_handle;
pub mod recommendations;
pub mod snapshot;

pub use job_handle::JobHandleStore;
pub use recommendations::RecommendationStore;
pub use snapshot::SnapshotStore;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::TaskResult;

/// Opens a single-connection pool over a file-backed SQLite database,
/// creating the file when absent.
///
/// One connection is deliberate: each store is exclusively owned by a single
/// pipeline run and all mutation happens in one transaction per run.
pub(crate) async fn open_file_pool(path: &str) -> TaskResult<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// In-memory variant used by tests. The single connection is pinned for the
/// pool's lifetime so the database survives between statements.
pub(crate) async fn open_memory_pool() -> TaskResult<SqlitePool> {
    let options = SqliteConnectOptions::new().in_memory(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    Ok(pool)
}
