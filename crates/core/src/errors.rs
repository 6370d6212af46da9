use thiserror::Error;

use crate::domain::UserId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("client {0} not found")]
    ClientNotFound(UserId),
    #[error("operator {0} is not registered")]
    OperatorNotFound(UserId),
    #[error("unrecognized status `{0}` (expected new|in_progress|closed)")]
    InvalidStatus(String),
    #[error("unrecognized sender `{0}` (expected client|operator)")]
    InvalidSender(String),
    #[error("quoted reply carries no usable relay target: {0}")]
    MalformedReplyTarget(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("operator {operator} is not allowed to {action}")]
    Unauthorized { operator: UserId, action: &'static str },
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl EngineError {
    /// Short text safe to send back over the channel. The event loop
    /// renders this instead of crashing: one malformed event must never
    /// affect processing of subsequent events.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::ClientNotFound(_)) => "That client does not exist.",
            Self::Domain(DomainError::OperatorNotFound(_)) => "That operator is not registered.",
            Self::Domain(DomainError::InvalidStatus(_)) => {
                "Unknown status. Use new, in_progress, or closed."
            }
            Self::Domain(DomainError::InvalidSender(_)) => "Malformed message record.",
            Self::Domain(DomainError::MalformedReplyTarget(_)) => {
                "Could not work out who that reply is for."
            }
            Self::Unauthorized { .. } => "Only the owner can do that.",
            Self::Persistence(_) => "Storage is temporarily unavailable. Try again shortly.",
        }
    }
}
