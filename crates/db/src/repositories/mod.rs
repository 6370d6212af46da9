use async_trait::async_trait;
use thiserror::Error;

use relaydesk_core::domain::UserId;
use relaydesk_core::errors::{DomainError, EngineError};
use relaydesk_core::{Client, ClientStatus, ClientSummary, Message, Operator, Sender};

pub mod client;
pub mod memory;
pub mod message;
pub mod operator;

pub use client::SqlClientRepository;
pub use memory::{InMemoryClientRepository, InMemoryMessageRepository, InMemoryOperatorRepository};
pub use message::SqlMessageRepository;
pub use operator::SqlOperatorRepository;

/// History fetches default to the last 20 entries, chronological.
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("client {0} not found")]
    ClientNotFound(UserId),
}

impl From<RepositoryError> for EngineError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::ClientNotFound(id) => DomainError::ClientNotFound(id).into(),
            other => EngineError::Persistence(other.to_string()),
        }
    }
}

#[async_trait]
pub trait OperatorRepository: Send + Sync {
    /// Idempotent upsert. An existing row is left untouched, so an owner
    /// is never downgraded by a plain re-add.
    async fn add(&self, id: UserId, is_owner: bool) -> Result<(), RepositoryError>;

    /// Deletes a non-owner operator. No-op if `id` is the owner.
    async fn remove(&self, id: UserId) -> Result<(), RepositoryError>;

    async fn is_operator(&self, id: UserId) -> Result<bool, RepositoryError>;
    async fn is_owner(&self, id: UserId) -> Result<bool, RepositoryError>;

    /// All registered operators, ordered by user id.
    async fn list(&self) -> Result<Vec<Operator>, RepositoryError>;
}

#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Creates the client with status `new` and an empty note if absent;
    /// otherwise returns the stored row unchanged. The name argument is
    /// ignored on repeat contact.
    async fn get_or_create(
        &self,
        id: UserId,
        display_name: &str,
    ) -> Result<Client, RepositoryError>;

    /// Clients ordered by display name ascending, optionally filtered by
    /// status. No pagination; fine at support-desk scale.
    async fn list(
        &self,
        filter: Option<ClientStatus>,
    ) -> Result<Vec<ClientSummary>, RepositoryError>;

    async fn get(&self, id: UserId) -> Result<Client, RepositoryError>;

    /// Fails with `ClientNotFound` for an absent client; idempotent for a
    /// known one.
    async fn set_status(&self, id: UserId, status: ClientStatus) -> Result<(), RepositoryError>;

    /// Same existence contract as `set_status`.
    async fn set_note(&self, id: UserId, note: &str) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Appends an immutable record with a server-assigned UTC timestamp.
    async fn append(
        &self,
        client_id: UserId,
        sender: Sender,
        text: &str,
    ) -> Result<(), RepositoryError>;

    /// The most recent `limit` entries, returned in chronological order.
    async fn history(
        &self,
        client_id: UserId,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError>;
}
