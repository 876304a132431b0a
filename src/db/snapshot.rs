use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use crate::error::{TaskError, TaskResult};

/// File-backed relational snapshot of the movie library
///
/// Owns the `Movies` table: a fixed base schema plus one boolean column per
/// known genre, added dynamically by the schema evolver. This is the only
/// module that splices identifiers into SQL text, and it refuses any name
/// outside `[A-Za-z0-9]`; every value is bound as a parameter.
pub struct SnapshotStore {
    pool: SqlitePool,
}

/// Base-schema projection of one snapshot row
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MovieRow {
    #[sqlx(rename = "Id")]
    pub id: String,
    #[sqlx(rename = "Name")]
    pub name: String,
    #[sqlx(rename = "CommunityRating")]
    pub community_rating: Option<f64>,
    #[sqlx(rename = "IsPlayed")]
    pub is_played: bool,
    #[sqlx(rename = "IsDeleted")]
    pub is_deleted: bool,
    #[sqlx(rename = "DateCreated")]
    pub date_created: String,
    #[sqlx(rename = "DateSynched")]
    pub date_synched: String,
}

/// One row to insert-or-replace during a synchronization pass
#[derive(Debug, Clone)]
pub struct MovieUpsert {
    pub id: String,
    pub name: String,
    pub community_rating: f64,
    pub is_played: bool,
    pub date_created: String,
    pub date_synched: String,
    /// `(column name, flag)` for every known genre column
    pub genre_flags: Vec<(String, bool)>,
}

/// Identifier whitelist for dynamically generated column names
pub(crate) fn is_safe_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric())
}

impl SnapshotStore {
    pub async fn open(path: &str) -> TaskResult<Self> {
        let pool = super::open_file_pool(path).await?;
        Ok(Self { pool })
    }

    pub async fn open_in_memory() -> TaskResult<Self> {
        let pool = super::open_memory_pool().await?;
        Ok(Self { pool })
    }

    /// Creates the `Movies` table and its id index when absent.
    ///
    /// The index may already exist from a prior run; that is logged and
    /// ignored, matching the additive-only schema contract.
    pub async fn create_if_absent(&self) -> TaskResult<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS [Movies] (
                [Id] TEXT NOT NULL PRIMARY KEY,
                [Name] TEXT NOT NULL,
                [CommunityRating] FLOAT NULL,
                [IsPlayed] BIT NOT NULL,
                [IsDeleted] BIT NOT NULL,
                [DateCreated] DATE NOT NULL,
                [DateSynched] DATE NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        if let Err(e) = sqlx::query(r#"CREATE INDEX "Id_Idx" ON "Movies" ("Id" ASC)"#)
            .execute(&self.pool)
            .await
        {
            tracing::warn!(error = %e, "Error creating index");
        }

        Ok(())
    }

    /// Current column names of the `Movies` table
    pub async fn existing_columns(&self) -> TaskResult<Vec<String>> {
        let rows = sqlx::query("PRAGMA table_info(Movies)")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(TaskError::from))
            .collect()
    }

    /// Adds a `BIT NOT NULL DEFAULT 0` column when it is not already present
    /// (compared case-insensitively). Returns whether a column was added.
    pub async fn add_column_if_absent(&self, column: &str) -> TaskResult<bool> {
        if !is_safe_identifier(column) {
            return Err(TaskError::SchemaEvolution(format!(
                "refusing unsafe column name '{}'",
                column
            )));
        }

        let existing = self.existing_columns().await?;
        if existing.iter().any(|c| c.eq_ignore_ascii_case(column)) {
            return Ok(false);
        }

        let statement = format!("ALTER TABLE [Movies] ADD [{}] BIT NOT NULL DEFAULT 0", column);
        sqlx::query(&statement).execute(&self.pool).await?;

        Ok(true)
    }

    /// Begins the per-run synchronization transaction.
    pub async fn begin(&self) -> TaskResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Inserts or replaces one row inside the synchronization transaction.
    ///
    /// The genre flag columns must already exist; their names are checked
    /// against the identifier whitelist before being spliced into the
    /// statement. All values are bound.
    pub async fn upsert_movie(
        tx: &mut Transaction<'static, Sqlite>,
        movie: &MovieUpsert,
    ) -> TaskResult<()> {
        let mut columns = String::from(
            "Id, Name, CommunityRating, IsPlayed, IsDeleted, DateCreated, DateSynched",
        );
        let mut placeholders = String::from("?, ?, ?, ?, ?, ?, ?");
        for (column, _) in &movie.genre_flags {
            if !is_safe_identifier(column) {
                return Err(TaskError::SchemaEvolution(format!(
                    "refusing unsafe column name '{}'",
                    column
                )));
            }
            columns.push_str(", ");
            columns.push_str(column);
            placeholders.push_str(", ?");
        }

        let statement = format!(
            "INSERT OR REPLACE INTO Movies ({}) VALUES ({})",
            columns, placeholders
        );

        let mut query = sqlx::query(&statement)
            .bind(&movie.id)
            .bind(&movie.name)
            .bind(movie.community_rating)
            .bind(movie.is_played)
            .bind(false)
            .bind(&movie.date_created)
            .bind(&movie.date_synched);
        for (_, flag) in &movie.genre_flags {
            query = query.bind(flag);
        }

        query.execute(&mut **tx).await?;
        Ok(())
    }

    /// Soft-deletes every row not touched by the current run: any row whose
    /// synchronization stamp differs from `stamp`. Returns the number of
    /// rows flipped.
    pub async fn mark_stale_deleted(&self, stamp: &str) -> TaskResult<u64> {
        let result = sqlx::query("UPDATE Movies SET IsDeleted = 1 WHERE DateSynched <> ?")
            .bind(stamp)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Fetches the base columns of one row, if present.
    pub async fn fetch_movie(&self, id: &str) -> TaskResult<Option<MovieRow>> {
        let row = sqlx::query_as::<_, MovieRow>(
            "SELECT Id, Name, CommunityRating, IsPlayed, IsDeleted, DateCreated, DateSynched \
             FROM Movies WHERE Id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Reads one genre flag column for one row.
    pub async fn genre_flag(&self, id: &str, column: &str) -> TaskResult<Option<bool>> {
        if !is_safe_identifier(column) {
            return Err(TaskError::SchemaEvolution(format!(
                "refusing unsafe column name '{}'",
                column
            )));
        }

        let statement = format!("SELECT [{}] FROM Movies WHERE Id = ?", column);
        let row = sqlx::query(&statement)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get::<bool, _>(0)?)),
            None => Ok(None),
        }
    }

    pub async fn count(&self) -> TaskResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) FROM Movies")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get(0)?)
    }
}
