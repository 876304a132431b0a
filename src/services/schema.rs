use crate::db::SnapshotStore;
use crate::error::TaskResult;
use crate::models::GenreColumns;

/// Outcome of one schema evolution pass
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SchemaReport {
    /// Columns added in this pass
    pub added: Vec<String>,
    /// Columns whose addition failed and was skipped
    pub skipped: Vec<String>,
}

/// Evolves the `Movies` table to cover the genre set observed in this pass.
///
/// Additive and idempotent: missing genre columns are added as
/// `BIT NOT NULL DEFAULT 0`, nothing is ever dropped or renamed. Each column
/// is attempted independently; a failure (for example a duplicate-column
/// error left by a partially applied prior run) is logged and skipped so the
/// remaining columns still evolve.
pub async fn evolve_schema(
    store: &SnapshotStore,
    genres: &GenreColumns,
) -> TaskResult<SchemaReport> {
    store.create_if_absent().await?;

    tracing::info!(genres = genres.len(), "Updating Movies table schema");

    let mut report = SchemaReport::default();
    for (_, column) in genres.iter() {
        match store.add_column_if_absent(column).await {
            Ok(true) => {
                tracing::info!(column, "Added genre column");
                report.added.push(column.to_string());
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(column, error = %e, "Error adding genre column, skipping");
                report.skipped.push(column.to_string());
            }
        }
    }

    tracing::info!(
        added = report.added.len(),
        skipped = report.skipped.len(),
        "Updated Movies table schema"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genre_set(labels: &[&str]) -> GenreColumns {
        let mut columns = GenreColumns::new();
        for label in labels {
            columns.insert(label);
        }
        columns
    }

    #[tokio::test]
    async fn test_evolve_adds_missing_columns() {
        let store = SnapshotStore::open_in_memory().await.unwrap();
        let report = evolve_schema(&store, &genre_set(&["Action", "sci-fi"]))
            .await
            .unwrap();

        assert_eq!(
            report.added,
            vec!["IsAction".to_string(), "IsSciFi".to_string()]
        );
        assert!(report.skipped.is_empty());

        let columns = store.existing_columns().await.unwrap();
        assert!(columns.iter().any(|c| c == "IsAction"));
        assert!(columns.iter().any(|c| c == "IsSciFi"));
    }

    #[tokio::test]
    async fn test_evolve_twice_is_a_no_op() {
        let store = SnapshotStore::open_in_memory().await.unwrap();
        let genres = genre_set(&["Action", "Drama"]);

        let first = evolve_schema(&store, &genres).await.unwrap();
        assert_eq!(first.added.len(), 2);

        let second = evolve_schema(&store, &genres).await.unwrap();
        assert!(second.added.is_empty());
        assert!(second.skipped.is_empty());

        let columns = store.existing_columns().await.unwrap();
        assert_eq!(columns.iter().filter(|c| *c == "IsAction").count(), 1);
    }

    #[tokio::test]
    async fn test_failed_column_is_skipped_and_later_columns_still_added() {
        let store = SnapshotStore::open_in_memory().await.unwrap();

        // "bad genre" sorts between the other keys, so its failure happens
        // mid-pass and must not abort the remaining columns.
        let mut genres = genre_set(&["Action"]);
        genres.insert_unchecked("bad genre", "Is Bad; Name");
        genres.insert_unchecked("western", "IsWestern");

        let report = evolve_schema(&store, &genres).await.unwrap();
        assert_eq!(
            report.added,
            vec!["IsAction".to_string(), "IsWestern".to_string()]
        );
        assert_eq!(report.skipped, vec!["Is Bad; Name".to_string()]);

        let columns = store.existing_columns().await.unwrap();
        assert!(columns.iter().any(|c| c == "IsWestern"));
        assert!(!columns.iter().any(|c| c == "Is Bad; Name"));
    }

    #[tokio::test]
    async fn test_evolve_never_drops_columns() {
        let store = SnapshotStore::open_in_memory().await.unwrap();
        evolve_schema(&store, &genre_set(&["Action"])).await.unwrap();

        // A later pass with a disjoint genre set leaves old columns in place.
        evolve_schema(&store, &genre_set(&["Drama"])).await.unwrap();

        let columns = store.existing_columns().await.unwrap();
        assert!(columns.iter().any(|c| c == "IsAction"));
        assert!(columns.iter().any(|c| c == "IsDrama"));
    }
}
