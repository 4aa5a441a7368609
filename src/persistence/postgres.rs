//! PostgreSQL implementation of the event log.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::StoredEvent;
use crate::error::MarketError;

/// PostgreSQL-backed event log using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresEventLog {
    pool: PgPool,
}

impl PostgresEventLog {
    /// Creates a new event log with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends an event to the log.
    ///
    /// # Errors
    ///
    /// Returns a [`MarketError::Persistence`] on database failure.
    pub async fn save_event(
        &self,
        subject_id: Uuid,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<i64, MarketError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO market_events (subject_id, event_type, payload) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(subject_id)
        .bind(event_type)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| MarketError::Persistence(e.to_string()))?;

        Ok(row)
    }

    /// Loads events after the given timestamp, optionally filtered by
    /// subject ID.
    ///
    /// # Errors
    ///
    /// Returns a [`MarketError::Persistence`] on database failure.
    pub async fn load_events_after(
        &self,
        after: DateTime<Utc>,
        subject_id: Option<Uuid>,
    ) -> Result<Vec<StoredEvent>, MarketError> {
        let rows = if let Some(sid) = subject_id {
            sqlx::query_as::<_, (i64, Uuid, String, serde_json::Value, DateTime<Utc>)>(
                "SELECT id, subject_id, event_type, payload, created_at FROM market_events \
                 WHERE created_at > $1 AND subject_id = $2 ORDER BY created_at ASC",
            )
            .bind(after)
            .bind(sid)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, (i64, Uuid, String, serde_json::Value, DateTime<Utc>)>(
                "SELECT id, subject_id, event_type, payload, created_at FROM market_events \
                 WHERE created_at > $1 ORDER BY created_at ASC",
            )
            .bind(after)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| MarketError::Persistence(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(
                |(id, subject_id, event_type, payload, created_at)| StoredEvent {
                    id,
                    subject_id,
                    event_type,
                    payload,
                    created_at,
                },
            )
            .collect())
    }

    /// Deletes events older than the given number of days.
    ///
    /// # Errors
    ///
    /// Returns a [`MarketError::Persistence`] on database failure.
    pub async fn delete_old_events(&self, before_days: u64) -> Result<u64, MarketError> {
        let cutoff =
            Utc::now() - chrono::Duration::days(i64::try_from(before_days).unwrap_or(i64::MAX));

        let result = sqlx::query("DELETE FROM market_events WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| MarketError::Persistence(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
