use std::collections::{BTreeMap, HashMap};

use tokio::sync::RwLock;

use chrono::Utc;

use relaydesk_core::domain::UserId;
use relaydesk_core::{Client, ClientStatus, ClientSummary, Message, Operator, Sender};

use super::{ClientRepository, MessageRepository, OperatorRepository, RepositoryError};

/// In-memory stand-ins for the SQL repositories. Used by engine unit
/// tests, including the simulated-restart reply-routing test (the store
/// survives while the router's transient sessions are rebuilt).
#[derive(Default)]
pub struct InMemoryOperatorRepository {
    operators: RwLock<BTreeMap<i64, bool>>,
}

#[async_trait::async_trait]
impl OperatorRepository for InMemoryOperatorRepository {
    async fn add(&self, id: UserId, is_owner: bool) -> Result<(), RepositoryError> {
        let mut operators = self.operators.write().await;
        operators.entry(id.0).or_insert(is_owner);
        Ok(())
    }

    async fn remove(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut operators = self.operators.write().await;
        if operators.get(&id.0).copied() == Some(false) {
            operators.remove(&id.0);
        }
        Ok(())
    }

    async fn is_operator(&self, id: UserId) -> Result<bool, RepositoryError> {
        Ok(self.operators.read().await.contains_key(&id.0))
    }

    async fn is_owner(&self, id: UserId) -> Result<bool, RepositoryError> {
        Ok(self.operators.read().await.get(&id.0).copied().unwrap_or(false))
    }

    async fn list(&self) -> Result<Vec<Operator>, RepositoryError> {
        let operators = self.operators.read().await;
        Ok(operators
            .iter()
            .map(|(&id, &is_owner)| Operator { id: UserId(id), is_owner })
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryClientRepository {
    clients: RwLock<HashMap<i64, Client>>,
}

#[async_trait::async_trait]
impl ClientRepository for InMemoryClientRepository {
    async fn get_or_create(
        &self,
        id: UserId,
        display_name: &str,
    ) -> Result<Client, RepositoryError> {
        let mut clients = self.clients.write().await;
        let client = clients.entry(id.0).or_insert_with(|| Client::new(id, display_name));
        Ok(client.clone())
    }

    async fn list(
        &self,
        filter: Option<ClientStatus>,
    ) -> Result<Vec<ClientSummary>, RepositoryError> {
        let clients = self.clients.read().await;
        let mut summaries: Vec<ClientSummary> = clients
            .values()
            .filter(|client| filter.map_or(true, |status| client.status == status))
            .map(|client| ClientSummary {
                id: client.id,
                display_name: client.display_name.clone(),
                status: client.status,
            })
            .collect();
        summaries.sort_by(|a, b| a.display_name.cmp(&b.display_name).then(a.id.cmp(&b.id)));
        Ok(summaries)
    }

    async fn get(&self, id: UserId) -> Result<Client, RepositoryError> {
        let clients = self.clients.read().await;
        clients.get(&id.0).cloned().ok_or(RepositoryError::ClientNotFound(id))
    }

    async fn set_status(&self, id: UserId, status: ClientStatus) -> Result<(), RepositoryError> {
        let mut clients = self.clients.write().await;
        let client = clients.get_mut(&id.0).ok_or(RepositoryError::ClientNotFound(id))?;
        client.status = status;
        Ok(())
    }

    async fn set_note(&self, id: UserId, note: &str) -> Result<(), RepositoryError> {
        let mut clients = self.clients.write().await;
        let client = clients.get_mut(&id.0).ok_or(RepositoryError::ClientNotFound(id))?;
        client.note = note.to_owned();
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: RwLock<Vec<Message>>,
}

#[async_trait::async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn append(
        &self,
        client_id: UserId,
        sender: Sender,
        text: &str,
    ) -> Result<(), RepositoryError> {
        let mut messages = self.messages.write().await;
        // Append-only, so the next id is just the current length + 1.
        let id = messages.len() as i64 + 1;
        messages.push(Message {
            id,
            client_id,
            sender,
            text: text.to_owned(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn history(
        &self,
        client_id: UserId,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError> {
        let messages = self.messages.read().await;
        let entries: Vec<Message> =
            messages.iter().filter(|m| m.client_id == client_id).cloned().collect();
        let skip = entries.len().saturating_sub(limit as usize);
        Ok(entries.into_iter().skip(skip).collect())
    }
}

#[cfg(test)]
mod tests {
    use relaydesk_core::domain::UserId;
    use relaydesk_core::{ClientStatus, Sender};

    use crate::repositories::{
        ClientRepository, InMemoryClientRepository, InMemoryMessageRepository,
        InMemoryOperatorRepository, MessageRepository, OperatorRepository, RepositoryError,
    };

    #[tokio::test]
    async fn in_memory_operator_repo_matches_sql_contract() {
        let repo = InMemoryOperatorRepository::default();
        repo.add(UserId(999), true).await.expect("add owner");
        repo.add(UserId(999), false).await.expect("re-add");
        repo.remove(UserId(999)).await.expect("remove owner no-op");

        assert!(repo.is_owner(UserId(999)).await.expect("is_owner"));
        assert_eq!(repo.list().await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn in_memory_client_repo_matches_sql_contract() {
        let repo = InMemoryClientRepository::default();
        let created = repo.get_or_create(UserId(1), "Alice").await.expect("create");
        let repeated = repo.get_or_create(UserId(1), "Someone Else").await.expect("repeat");
        assert_eq!(created, repeated);

        let error = repo.set_status(UserId(2), ClientStatus::Closed).await.expect_err("unknown");
        assert!(matches!(error, RepositoryError::ClientNotFound(UserId(2))));
    }

    #[tokio::test]
    async fn in_memory_history_applies_the_limit_from_the_tail() {
        let repo = InMemoryMessageRepository::default();
        for n in 1..=4 {
            repo.append(UserId(1), Sender::Client, &format!("m{n}")).await.expect("append");
        }

        let history = repo.history(UserId(1), 2).await.expect("history");
        let texts: Vec<&str> = history.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["m3", "m4"]);
        assert!(history.iter().all(|m| m.sender == Sender::Client));
    }
}
