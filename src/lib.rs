//! Library snapshot & training orchestration for smart inbox recommendations.
//!
//! Periodically extracts a movie library's metadata and viewing state into a
//! file-backed SQLite snapshot whose schema follows the genres present in the
//! library, ships the snapshot to an external training service, and polls for
//! the recommendations that come back.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use config::{Config, Hyperparameters};
pub use error::{TaskError, TaskResult};
pub use services::pipeline::{Pipeline, Progress, RunOutcome, RunState};
pub use services::providers::{CatalogSource, EmbyCatalog};
pub use services::recommendations::PollOutcome;
