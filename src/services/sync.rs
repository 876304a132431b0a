use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};

use crate::db::snapshot::{MovieUpsert, SnapshotStore};
use crate::error::{TaskError, TaskResult};
use crate::models::{CatalogItem, GenreColumns};
use crate::services::pipeline::Progress;

/// Timestamp format shared by `DateCreated` and `DateSynched`. Fixed-width
/// and zero-padded, so the soft-delete stamp comparison is a plain text
/// equality check.
pub const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats the per-run synchronization stamp.
pub fn run_stamp(now: DateTime<Utc>) -> String {
    now.format(STAMP_FORMAT).to_string()
}

/// Accounting for one synchronization pass
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub upserted: usize,
    pub skipped_no_key: usize,
    pub skipped_no_rating: usize,
    pub soft_deleted: u64,
}

/// Synchronizes the snapshot with the current catalog.
///
/// Every eligible item (non-empty provider key and a community rating) is
/// upserted with its genre-flag vector and the run's stamp, inside a single
/// transaction; a mid-pass failure rolls the whole pass back. After commit,
/// one bulk update soft-deletes every row the pass did not touch. Progress
/// is reported proportionally and tops out at 50.
pub async fn synchronize(
    store: &SnapshotStore,
    items: &[CatalogItem],
    genres: &GenreColumns,
    stamp: &str,
    progress: &Progress,
) -> TaskResult<SyncReport> {
    tracing::info!(items = items.len(), stamp, "Updating Movies table");

    let mut report = SyncReport::default();
    let mut tx = store.begin().await.map_err(sync_err)?;

    for (index, item) in items.iter().enumerate() {
        progress.report(index as f64 * 100.0 / (2 * items.len()) as f64);

        let Some(key) = item.provider_key() else {
            report.skipped_no_key += 1;
            continue;
        };
        // Rating absence is an exclusion filter, never a zero value.
        let Some(rating) = item.community_rating else {
            report.skipped_no_rating += 1;
            continue;
        };

        // Normalized per item; genre labels vary in case and whitespace
        // from one item to the next.
        let item_genres: HashSet<String> = item
            .genres
            .iter()
            .map(|g| GenreColumns::normalize(g))
            .collect();
        // Distinct normalized keys can share a generated column name
        // ("sci fi" and "sci-fi" both map to IsSciFi); the flag is the OR
        // of membership across every key naming the column, so one column
        // appears at most once in the upsert.
        let mut flags: BTreeMap<&str, bool> = BTreeMap::new();
        for (genre_key, column) in genres.iter() {
            *flags.entry(column).or_insert(false) |= item_genres.contains(genre_key);
        }
        let genre_flags = flags
            .into_iter()
            .map(|(column, member)| (column.to_string(), member))
            .collect();

        let upsert = MovieUpsert {
            id: key.into_string(),
            name: item.name.clone(),
            community_rating: f64::from(rating),
            is_played: item.is_played,
            date_created: item.date_of_record().format(STAMP_FORMAT).to_string(),
            date_synched: stamp.to_string(),
            genre_flags,
        };

        SnapshotStore::upsert_movie(&mut tx, &upsert)
            .await
            .map_err(sync_err)?;
        report.upserted += 1;
    }

    tx.commit().await.map_err(|e| sync_err(e.into()))?;

    tracing::info!("Synchronizing deleted items");
    report.soft_deleted = store.mark_stale_deleted(stamp).await.map_err(sync_err)?;

    tracing::info!(
        upserted = report.upserted,
        skipped_no_key = report.skipped_no_key,
        skipped_no_rating = report.skipped_no_rating,
        soft_deleted = report.soft_deleted,
        "Updated Movies table"
    );

    Ok(report)
}

fn sync_err(e: TaskError) -> TaskError {
    match e {
        TaskError::Synchronization(_) => e,
        other => TaskError::Synchronization(other.to_string()),
    }
}
