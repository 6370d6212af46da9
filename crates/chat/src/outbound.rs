use serde::Serialize;

use relaydesk_core::domain::UserId;

use crate::events::OperatorAction;

/// A delivery instruction produced by the router. The adapter turns these
/// into platform messages; the router never talks to the platform itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Outbound {
    /// Plain message. `correlation` identifies the client a reply to this
    /// message should be relayed to; adapters echo it back in `ReplyRef`.
    Notify { recipient: UserId, text: String, correlation: Option<UserId> },
    /// Message with selectable actions attached.
    Render { recipient: UserId, text: String, menu: Menu },
}

impl Outbound {
    pub fn notify(recipient: UserId, text: impl Into<String>) -> Self {
        Self::Notify { recipient, text: text.into(), correlation: None }
    }

    pub fn notify_about(recipient: UserId, text: impl Into<String>, client: UserId) -> Self {
        Self::Notify { recipient, text: text.into(), correlation: Some(client) }
    }

    pub fn render(recipient: UserId, text: impl Into<String>, menu: Menu) -> Self {
        Self::Render { recipient, text: text.into(), menu }
    }

    pub fn recipient(&self) -> UserId {
        match self {
            Self::Notify { recipient, .. } | Self::Render { recipient, .. } => *recipient,
        }
    }
}

/// A grid of selectable actions, row-major like a reply keyboard.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Menu {
    pub rows: Vec<Vec<MenuButton>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MenuButton {
    pub label: String,
    pub action: OperatorAction,
}

impl MenuButton {
    pub fn new(label: impl Into<String>, action: OperatorAction) -> Self {
        Self { label: label.into(), action }
    }
}

impl Menu {
    pub fn buttons(&self) -> impl Iterator<Item = &MenuButton> {
        self.rows.iter().flatten()
    }
}
