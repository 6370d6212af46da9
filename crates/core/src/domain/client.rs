use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::UserId;
use crate::errors::DomainError;

/// Triage status of a client conversation. Closed enumeration: anything
/// outside these three values is rejected at the parse boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    New,
    InProgress,
    Closed,
}

impl ClientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ClientStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "in_progress" => Ok(Self::InProgress),
            "closed" => Ok(Self::Closed),
            other => Err(DomainError::InvalidStatus(other.to_owned())),
        }
    }
}

/// An end user whose messages are relayed to operators. Created lazily on
/// first contact and never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: UserId,
    pub display_name: String,
    pub status: ClientStatus,
    pub note: String,
}

impl Client {
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self { id, display_name: display_name.into(), status: ClientStatus::New, note: String::new() }
    }
}

/// Listing row: enough to render one button per client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSummary {
    pub id: UserId,
    pub display_name: String,
    pub status: ClientStatus,
}
