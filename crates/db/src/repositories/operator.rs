use sqlx::Row;

use relaydesk_core::domain::UserId;
use relaydesk_core::Operator;

use super::{OperatorRepository, RepositoryError};
use crate::DbPool;

pub struct SqlOperatorRepository {
    pool: DbPool,
}

impl SqlOperatorRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_operator(row: &sqlx::sqlite::SqliteRow) -> Result<Operator, RepositoryError> {
    let user_id: i64 =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let is_owner: bool =
        row.try_get("is_owner").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    Ok(Operator { id: UserId(user_id), is_owner })
}

#[async_trait::async_trait]
impl OperatorRepository for SqlOperatorRepository {
    async fn add(&self, id: UserId, is_owner: bool) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO operators (user_id, is_owner) VALUES (?, ?)
             ON CONFLICT(user_id) DO NOTHING",
        )
        .bind(id.0)
        .bind(is_owner)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM operators WHERE user_id = ? AND is_owner = 0")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn is_operator(&self, id: UserId) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT 1 FROM operators WHERE user_id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn is_owner(&self, id: UserId) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT is_owner FROM operators WHERE user_id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                row.try_get::<bool, _>("is_owner").map_err(|e| RepositoryError::Decode(e.to_string()))
            }
            None => Ok(false),
        }
    }

    async fn list(&self) -> Result<Vec<Operator>, RepositoryError> {
        let rows = sqlx::query("SELECT user_id, is_owner FROM operators ORDER BY user_id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_operator).collect()
    }
}
