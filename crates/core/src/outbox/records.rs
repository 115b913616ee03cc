//! Pending submission CRUD operations.
//!
//! Provides functions for enqueuing, listing, and removing queued
//! form submissions.

use super::connection::OutboxDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// A form submission waiting for delivery.
///
/// Created when a submit fails to reach the network, persisted until the
/// sync agent delivers it, then deleted. The payload is opaque JSON; the
/// sync agent never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingSubmission {
    pub id: String,
    pub payload: serde_json::Value,
    pub queued_at: String,
}

impl PendingSubmission {
    /// Build a submission with the current timestamp.
    pub fn new(id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self { id: id.into(), payload, queued_at: chrono::Utc::now().to_rfc3339() }
    }
}

impl OutboxDb {
    /// Insert or replace a pending submission.
    ///
    /// Uses UPSERT semantics keyed by id: enqueuing the same id twice
    /// leaves exactly one record.
    pub async fn enqueue(&self, submission: &PendingSubmission) -> Result<(), Error> {
        if submission.id.is_empty() {
            return Err(Error::InvalidInput("submission id cannot be empty".into()));
        }

        let submission = submission.clone();
        let payload_json = serde_json::to_string(&submission.payload)
            .map_err(|e| Error::InvalidInput(format!("unserializable payload: {e}")))?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO outbox (id, payload_json, queued_at)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(id) DO UPDATE SET
                        payload_json = excluded.payload_json,
                        queued_at = excluded.queued_at",
                    params![&submission.id, &payload_json, &submission.queued_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// List all pending submissions as a snapshot.
    ///
    /// Iteration order is unspecified and must not be relied upon.
    pub async fn list_all(&self) -> Result<Vec<PendingSubmission>, Error> {
        self.conn
            .call(move |conn| -> Result<Vec<PendingSubmission>, Error> {
                let mut stmt = conn.prepare("SELECT id, payload_json, queued_at FROM outbox")?;

                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
                })?;

                let mut submissions = Vec::new();
                for row in rows {
                    let (id, payload_json, queued_at) = row?;
                    let payload = serde_json::from_str(&payload_json)
                        .map_err(|e| Error::InvalidInput(format!("corrupt payload for {id}: {e}")))?;
                    submissions.push(PendingSubmission { id, payload, queued_at });
                }

                Ok(submissions)
            })
            .await
            .map_err(Error::from)
    }

    /// Remove a submission by id.
    ///
    /// A no-op if the id is absent.
    pub async fn remove_by_id(&self, id: &str) -> Result<(), Error> {
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("DELETE FROM outbox WHERE id = ?1", params![id])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Number of submissions currently pending.
    pub async fn pending_count(&self) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM outbox", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
