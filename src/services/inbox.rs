use std::collections::HashMap;
use std::path::Path;

use crate::db::RecommendationStore;
use crate::error::TaskResult;
use crate::models::{CatalogItem, MediaRef};
use crate::services::providers::CatalogSource;

/// Read accessor for the display surface
///
/// Returns the catalog items whose provider key matches a positively
/// classified recommendation, projected into a minimal media reference. A
/// missing recommendations file means training has not produced results yet
/// and yields an empty list, not an error.
pub async fn recommended_media(
    catalog: &dyn CatalogSource,
    recommendations_path: &str,
) -> TaskResult<Vec<MediaRef>> {
    if !Path::new(recommendations_path).exists() {
        tracing::debug!(
            path = recommendations_path,
            "No recommendations database yet"
        );
        return Ok(Vec::new());
    }

    let store = RecommendationStore::open(recommendations_path).await?;
    store.create_if_absent().await?;
    let positive = store.positive_ids().await?;
    if positive.is_empty() {
        return Ok(Vec::new());
    }

    let items = catalog.movies().await?;
    let mut by_key: HashMap<String, &CatalogItem> = HashMap::new();
    for item in &items {
        if let Some(key) = item.provider_key() {
            // First occurrence wins when two items share a key.
            by_key.entry(key.into_string()).or_insert(item);
        }
    }

    let media: Vec<MediaRef> = positive
        .iter()
        .filter_map(|id| by_key.get(id))
        .map(|item| MediaRef {
            item_id: item.item_id.clone(),
            path: item.path.clone(),
            name: item.name.clone(),
        })
        .collect();

    tracing::info!(
        recommended = positive.len(),
        matched = media.len(),
        "Resolved recommended media"
    );

    Ok(media)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Recommendation;
    use crate::services::providers::MockCatalogSource;
    use chrono::{TimeZone, Utc};

    fn item(item_id: &str, imdb: &str, name: &str) -> CatalogItem {
        CatalogItem {
            item_id: item_id.to_string(),
            name: name.to_string(),
            path: Some(format!("/movies/{}.mkv", item_id)),
            provider_ids: vec![("Imdb".to_string(), imdb.to_string())],
            community_rating: Some(7.0),
            is_played: false,
            genres: vec![],
            date_created: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            date_modified: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_yields_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recs.db");

        let mut catalog = MockCatalogSource::new();
        catalog.expect_movies().times(0);

        let media = recommended_media(&catalog, path.to_str().unwrap())
            .await
            .unwrap();
        assert!(media.is_empty());
    }

    #[tokio::test]
    async fn test_positive_recommendations_join_to_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recs.db");
        let path_str = path.to_str().unwrap().to_string();

        let store = RecommendationStore::open(&path_str).await.unwrap();
        store.create_if_absent().await.unwrap();
        store
            .replace_all(&[
                Recommendation {
                    id: "Imdb=tt1".to_string(),
                    title: "Liked".to_string(),
                    recommendation_type: 1,
                },
                Recommendation {
                    id: "Imdb=tt2".to_string(),
                    title: "Disliked".to_string(),
                    recommendation_type: 0,
                },
                Recommendation {
                    id: "Imdb=gone".to_string(),
                    title: "Removed from library".to_string(),
                    recommendation_type: 1,
                },
            ])
            .await
            .unwrap();
        drop(store);

        let mut catalog = MockCatalogSource::new();
        catalog.expect_movies().returning(|| {
            Ok(vec![
                item("10", "tt1", "Liked"),
                item("11", "tt2", "Disliked"),
            ])
        });

        let media = recommended_media(&catalog, &path_str).await.unwrap();
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].item_id, "10");
        assert_eq!(media[0].name, "Liked");
    }
}
