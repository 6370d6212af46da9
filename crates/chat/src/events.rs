use serde::{Deserialize, Serialize};

use relaydesk_core::domain::UserId;
use relaydesk_core::ClientStatus;

/// An inbound event from the presentation adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inbound {
    /// The user opened the bot (/start or equivalent).
    Start { user_id: UserId, display_name: String, is_bootstrap_owner: bool },
    /// An operator pressed a menu button.
    Action { operator_id: UserId, action: OperatorAction },
    /// A plain text message from anyone.
    Text { sender_id: UserId, display_name: String, text: String, reply_to: Option<ReplyRef> },
}

impl Inbound {
    /// Who to send an error notice to when handling this event fails.
    pub fn sender(&self) -> UserId {
        match self {
            Self::Start { user_id, .. } => *user_id,
            Self::Action { operator_id, .. } => *operator_id,
            Self::Text { sender_id, .. } => *sender_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatorAction {
    ListClients,
    /// `None` lists every client.
    FilterByStatus(Option<ClientStatus>),
    OpenClient(UserId),
    WriteToClient(UserId),
    SetStatus(UserId, ClientStatus),
    AddNote(UserId),
    Finish,
    MainMenu,
    Help,
    ListOperators,
    AddOperator(UserId),
    RemoveOperator(UserId),
}

impl OperatorAction {
    /// Compact JSON form carried as button callback data. Platforms cap
    /// callback payloads at a few dozen bytes, hence no pretty printing.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

/// What the adapter knows about the message a reply quotes. The
/// correlation id is metadata echoed back from an earlier notification;
/// the quoted text is the raw fallback for transports that cannot
/// round-trip metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplyRef {
    pub correlation: Option<UserId>,
    pub quoted_text: Option<String>,
}

impl ReplyRef {
    pub fn correlated(client: UserId) -> Self {
        Self { correlation: Some(client), quoted_text: None }
    }

    pub fn quoted(text: impl Into<String>) -> Self {
        Self { correlation: None, quoted_text: Some(text.into()) }
    }
}
