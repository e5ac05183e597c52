//! SQLite database operations
//!
//! All database access goes through this module.
//! Queries check a connection out of the pool for the duration of the
//! statement; nothing request-scoped is cached elsewhere.

use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::Post;
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect to the SQLite database at `path`.
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically; the schema script uses
    /// conditional creation, so this is safe on an existing database.
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
            }
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    /// List all posts, most recent first.
    ///
    /// Returns every row; the application does not paginate.
    pub async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT id, title, text FROM post ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Insert a new post and return its id.
    ///
    /// The insert runs inside an explicit transaction so an aborted
    /// request can never leave a partially written row behind.
    pub async fn create_post(&self, title: &str, text: &str) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("INSERT INTO post (title, text) VALUES (?, ?)")
            .bind(title)
            .bind(text)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.last_insert_rowid())
    }

    /// Count posts. Used by tests to assert rejected submissions
    /// leave the table untouched.
    pub async fn count_posts(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
