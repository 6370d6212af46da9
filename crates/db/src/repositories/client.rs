use sqlx::Row;

use relaydesk_core::domain::UserId;
use relaydesk_core::{Client, ClientStatus, ClientSummary};

use super::{ClientRepository, RepositoryError};
use crate::DbPool;

pub struct SqlClientRepository {
    pool: DbPool,
}

impl SqlClientRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode_status(raw: &str) -> Result<ClientStatus, RepositoryError> {
    raw.parse::<ClientStatus>().map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn row_to_client(row: &sqlx::sqlite::SqliteRow) -> Result<Client, RepositoryError> {
    let user_id: i64 =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let display_name: String =
        row.try_get("display_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let note: String = row.try_get("note").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Client { id: UserId(user_id), display_name, status: decode_status(&status)?, note })
}

fn row_to_summary(row: &sqlx::sqlite::SqliteRow) -> Result<ClientSummary, RepositoryError> {
    let user_id: i64 =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let display_name: String =
        row.try_get("display_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(ClientSummary { id: UserId(user_id), display_name, status: decode_status(&status)? })
}

#[async_trait::async_trait]
impl ClientRepository for SqlClientRepository {
    async fn get_or_create(
        &self,
        id: UserId,
        display_name: &str,
    ) -> Result<Client, RepositoryError> {
        // DO NOTHING keeps the stored name on repeat contact.
        sqlx::query(
            "INSERT INTO clients (user_id, display_name, status, note) VALUES (?, ?, 'new', '')
             ON CONFLICT(user_id) DO NOTHING",
        )
        .bind(id.0)
        .bind(display_name)
        .execute(&self.pool)
        .await?;

        self.get(id).await
    }

    async fn list(
        &self,
        filter: Option<ClientStatus>,
    ) -> Result<Vec<ClientSummary>, RepositoryError> {
        let rows = match filter {
            Some(status) => {
                sqlx::query(
                    "SELECT user_id, display_name, status FROM clients
                     WHERE status = ? ORDER BY display_name ASC, user_id ASC",
                )
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT user_id, display_name, status FROM clients
                     ORDER BY display_name ASC, user_id ASC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(row_to_summary).collect()
    }

    async fn get(&self, id: UserId) -> Result<Client, RepositoryError> {
        let row = sqlx::query(
            "SELECT user_id, display_name, status, note FROM clients WHERE user_id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_client(&row),
            None => Err(RepositoryError::ClientNotFound(id)),
        }
    }

    async fn set_status(&self, id: UserId, status: ClientStatus) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE clients SET status = ? WHERE user_id = ?")
            .bind(status.as_str())
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::ClientNotFound(id));
        }
        Ok(())
    }

    async fn set_note(&self, id: UserId, note: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE clients SET note = ? WHERE user_id = ?")
            .bind(note)
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::ClientNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use relaydesk_core::domain::UserId;
    use relaydesk_core::ClientStatus;

    use super::SqlClientRepository;
    use crate::repositories::{ClientRepository, RepositoryError};
    use crate::{connect_with_settings, migrations};

    const ALICE: UserId = UserId(111);

    async fn setup() -> SqlClientRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlClientRepository::new(pool)
    }

    #[tokio::test]
    async fn creation_is_idempotent_and_keeps_the_first_name() {
        let repo = setup().await;

        let first = repo.get_or_create(ALICE, "Alice").await.expect("create");
        assert_eq!(first.status, ClientStatus::New);
        assert_eq!(first.note, "");

        let second = repo.get_or_create(ALICE, "Alice Smith").await.expect("repeat contact");
        assert_eq!(second.display_name, "Alice");
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn status_round_trips_and_is_idempotent() {
        let repo = setup().await;
        repo.get_or_create(ALICE, "Alice").await.expect("create");

        repo.set_status(ALICE, ClientStatus::InProgress).await.expect("set status");
        repo.set_status(ALICE, ClientStatus::InProgress).await.expect("same status again");

        let client = repo.get(ALICE).await.expect("get");
        assert_eq!(client.status, ClientStatus::InProgress);
    }

    #[tokio::test]
    async fn mutations_on_unknown_clients_fail_with_not_found() {
        let repo = setup().await;
        let ghost = UserId(404);

        let status_err =
            repo.set_status(ghost, ClientStatus::Closed).await.expect_err("unknown client");
        assert!(matches!(status_err, RepositoryError::ClientNotFound(id) if id == ghost));

        let note_err = repo.set_note(ghost, "vip").await.expect_err("unknown client");
        assert!(matches!(note_err, RepositoryError::ClientNotFound(id) if id == ghost));

        let get_err = repo.get(ghost).await.expect_err("unknown client");
        assert!(matches!(get_err, RepositoryError::ClientNotFound(id) if id == ghost));
    }

    #[tokio::test]
    async fn note_updates_persist() {
        let repo = setup().await;
        repo.get_or_create(ALICE, "Alice").await.expect("create");

        repo.set_note(ALICE, "prefers email").await.expect("set note");
        assert_eq!(repo.get(ALICE).await.expect("get").note, "prefers email");

        repo.set_note(ALICE, "prefers email").await.expect("same note again");
        assert_eq!(repo.get(ALICE).await.expect("get").note, "prefers email");
    }

    #[tokio::test]
    async fn listing_orders_by_name_and_honors_the_filter() {
        let repo = setup().await;
        repo.get_or_create(UserId(3), "Carol").await.expect("create");
        repo.get_or_create(UserId(1), "Alice").await.expect("create");
        repo.get_or_create(UserId(2), "Bob").await.expect("create");
        repo.set_status(UserId(2), ClientStatus::Closed).await.expect("close bob");

        let all = repo.list(None).await.expect("list all");
        let names: Vec<&str> = all.iter().map(|c| c.display_name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Carol"]);

        let closed = repo.list(Some(ClientStatus::Closed)).await.expect("list closed");
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].display_name, "Bob");

        let in_progress = repo.list(Some(ClientStatus::InProgress)).await.expect("list empty");
        assert!(in_progress.is_empty());
    }
}
