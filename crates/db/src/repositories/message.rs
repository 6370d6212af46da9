use chrono::{DateTime, Utc};
use sqlx::Row;

use relaydesk_core::domain::UserId;
use relaydesk_core::{Message, Sender};

use super::{MessageRepository, RepositoryError};
use crate::DbPool;

pub struct SqlMessageRepository {
    pool: DbPool,
}

impl SqlMessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<Message, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let client_id: i64 =
        row.try_get("client_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let sender: String =
        row.try_get("sender").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let text: String = row.try_get("text").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let sender = sender.parse::<Sender>().map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| RepositoryError::Decode(e.to_string()))?
        .with_timezone(&Utc);

    Ok(Message { id, client_id: UserId(client_id), sender, text, created_at })
}

#[async_trait::async_trait]
impl MessageRepository for SqlMessageRepository {
    async fn append(
        &self,
        client_id: UserId,
        sender: Sender,
        text: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO messages (client_id, sender, text, created_at) VALUES (?, ?, ?, ?)")
            .bind(client_id.0)
            .bind(sender.as_str())
            .bind(text)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn history(
        &self,
        client_id: UserId,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError> {
        // Most-recent-first with LIMIT, then re-reversed so the viewer
        // always reads chronologically. Id breaks created_at ties.
        let rows = sqlx::query(
            "SELECT id, client_id, sender, text, created_at FROM messages
             WHERE client_id = ?
             ORDER BY created_at DESC, id DESC
             LIMIT ?",
        )
        .bind(client_id.0)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut entries =
            rows.iter().map(row_to_message).collect::<Result<Vec<_>, RepositoryError>>()?;
        entries.reverse();
        Ok(entries)
    }
}
