use sqlx::{Row, SqlitePool};

use crate::error::TaskResult;
use crate::models::{Recommendation, RecommendationKind};

/// File-backed store of the latest training results
///
/// The whole result set is replaced atomically on every successful poll, so
/// readers never observe a half-updated set.
pub struct RecommendationStore {
    pool: SqlitePool,
}

impl RecommendationStore {
    pub async fn open(path: &str) -> TaskResult<Self> {
        let pool = super::open_file_pool(path).await?;
        Ok(Self { pool })
    }

    pub async fn open_in_memory() -> TaskResult<Self> {
        let pool = super::open_memory_pool().await?;
        Ok(Self { pool })
    }

    pub async fn create_if_absent(&self) -> TaskResult<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS [Recommendations] (
                [Id] TEXT NOT NULL PRIMARY KEY,
                [Name] TEXT NOT NULL,
                [Recommendation] INT NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Replaces the entire result set: delete-all then insert-all, in one
    /// transaction. An empty slice is valid and leaves the table empty.
    pub async fn replace_all(&self, recommendations: &[Recommendation]) -> TaskResult<usize> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM Recommendations")
            .execute(&mut *tx)
            .await?;

        for rec in recommendations {
            sqlx::query("INSERT INTO Recommendations (Id, Name, Recommendation) VALUES (?, ?, ?)")
                .bind(&rec.id)
                .bind(&rec.title)
                .bind(rec.recommendation_type)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(recommendations.len())
    }

    /// Ids of positively classified recommendations, for the display surface.
    pub async fn positive_ids(&self) -> TaskResult<Vec<String>> {
        let rows = sqlx::query("SELECT Id FROM Recommendations WHERE Recommendation = ?")
            .bind(RecommendationKind::Recommended.code())
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("Id").map_err(Into::into))
            .collect()
    }

    pub async fn count(&self) -> TaskResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) FROM Recommendations")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get(0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, kind: i64) -> Recommendation {
        Recommendation {
            id: id.to_string(),
            title: id.to_uppercase(),
            recommendation_type: kind,
        }
    }

    #[tokio::test]
    async fn test_replace_all_swaps_result_set() {
        let store = RecommendationStore::open_in_memory().await.unwrap();
        store.create_if_absent().await.unwrap();

        store
            .replace_all(&[rec("a", 1), rec("b", 0)])
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 2);

        store.replace_all(&[rec("c", 1)]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.positive_ids().await.unwrap(), vec!["c".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_replace_clears_prior_contents() {
        let store = RecommendationStore::open_in_memory().await.unwrap();
        store.create_if_absent().await.unwrap();

        store.replace_all(&[rec("a", 1)]).await.unwrap();
        let saved = store.replace_all(&[]).await.unwrap();
        assert_eq!(saved, 0);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_positive_ids_filters_classification() {
        let store = RecommendationStore::open_in_memory().await.unwrap();
        store.create_if_absent().await.unwrap();

        store
            .replace_all(&[rec("yes", 1), rec("no", 0), rec("other", 3)])
            .await
            .unwrap();
        assert_eq!(store.positive_ids().await.unwrap(), vec!["yes".to_string()]);
    }
}
