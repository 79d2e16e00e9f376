//! SQLite-backed durable user presence.

use async_trait::async_trait;
use chatrelay_domain::{PresenceStatus, UserId, UserPresence};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::infrastructure::ports::{RepoError, UserStatusRepo};

/// SQLite implementation of the durable user status store.
///
/// Writes upsert, so a user the relay has never seen before gets a row on
/// its first announcement.
pub struct SqliteUserStatusRepo {
    pool: SqlitePool,
}

impl SqliteUserStatusRepo {
    pub async fn new(db_path: &str) -> Result<Self, RepoError> {
        let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .map_err(|e| RepoError::database("user_status.connect", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_presence (
                user_id TEXT PRIMARY KEY NOT NULL,
                status TEXT NOT NULL,
                last_seen TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::database("user_status.migrate", e))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl UserStatusRepo for SqliteUserStatusRepo {
    async fn set_status(
        &self,
        user_id: &UserId,
        status: PresenceStatus,
        last_seen: DateTime<Utc>,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO user_presence (user_id, status, last_seen)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                status = excluded.status,
                last_seen = excluded.last_seen
            "#,
        )
        .bind(user_id.as_str())
        .bind(status.as_str())
        .bind(last_seen.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("user_status.set", e))?;

        Ok(())
    }

    async fn get_presence(&self, user_id: &UserId) -> Result<Option<UserPresence>, RepoError> {
        let row = sqlx::query("SELECT status, last_seen FROM user_presence WHERE user_id = ?")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("user_status.get", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let status: String = row.get("status");
        let last_seen: String = row.get("last_seen");

        let status = status
            .parse::<PresenceStatus>()
            .map_err(RepoError::serialization)?;
        let last_seen = DateTime::parse_from_rfc3339(&last_seen)
            .map_err(RepoError::serialization)?
            .with_timezone(&Utc);

        Ok(Some(UserPresence {
            user_id: user_id.clone(),
            status,
            last_seen,
        }))
    }
}
