//! Menu builders for the operator screens: main menu, status filter,
//! client listing, and the per-client card.

use relaydesk_core::domain::UserId;
use relaydesk_core::{Client, ClientStatus, ClientSummary, Message};

use crate::events::OperatorAction;
use crate::outbound::{Menu, MenuButton};

pub struct MenuBuilder {
    rows: Vec<Vec<MenuButton>>,
}

impl MenuBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn row<F>(mut self, build: F) -> Self
    where
        F: FnOnce(&mut RowBuilder),
    {
        let mut builder = RowBuilder::default();
        build(&mut builder);
        self.rows.push(builder.buttons);
        self
    }

    pub fn build(self) -> Menu {
        Menu { rows: self.rows }
    }
}

impl Default for MenuBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
pub struct RowBuilder {
    buttons: Vec<MenuButton>,
}

impl RowBuilder {
    pub fn button(&mut self, label: impl Into<String>, action: OperatorAction) -> &mut Self {
        self.buttons.push(MenuButton::new(label, action));
        self
    }
}

pub fn main_menu() -> Menu {
    MenuBuilder::new()
        .row(|r| {
            r.button("Clients", OperatorAction::ListClients);
        })
        .row(|r| {
            r.button("Operators", OperatorAction::ListOperators);
        })
        .row(|r| {
            r.button("Help", OperatorAction::Help);
        })
        .row(|r| {
            r.button("Main menu", OperatorAction::MainMenu);
        })
        .build()
}

pub fn status_menu() -> Menu {
    MenuBuilder::new()
        .row(|r| {
            r.button("New", OperatorAction::FilterByStatus(Some(ClientStatus::New))).button(
                "In progress",
                OperatorAction::FilterByStatus(Some(ClientStatus::InProgress)),
            );
        })
        .row(|r| {
            r.button("Closed", OperatorAction::FilterByStatus(Some(ClientStatus::Closed)))
                .button("All", OperatorAction::FilterByStatus(None));
        })
        .row(|r| {
            r.button("Back", OperatorAction::MainMenu);
        })
        .build()
}

/// One button per client, labeled "name (status)", ordering preserved
/// from the store (display name ascending).
pub fn client_list(clients: &[ClientSummary]) -> Menu {
    let mut builder = MenuBuilder::new();
    for client in clients {
        let label = format!("{} ({})", client.display_name, client.status);
        let action = OperatorAction::OpenClient(client.id);
        builder = builder.row(move |r| {
            r.button(label, action);
        });
    }
    builder.build()
}

pub fn client_card(client_id: UserId) -> Menu {
    MenuBuilder::new()
        .row(|r| {
            r.button("Write to client", OperatorAction::WriteToClient(client_id));
        })
        .row(|r| {
            r.button("New", OperatorAction::SetStatus(client_id, ClientStatus::New))
                .button("In progress", OperatorAction::SetStatus(client_id, ClientStatus::InProgress))
                .button("Closed", OperatorAction::SetStatus(client_id, ClientStatus::Closed));
        })
        .row(|r| {
            r.button("Add note", OperatorAction::AddNote(client_id));
        })
        .row(|r| {
            r.button("Finish chat", OperatorAction::Finish);
        })
        .build()
}

pub fn card_text(client: &Client) -> String {
    let note = if client.note.is_empty() { "-" } else { client.note.as_str() };
    format!("{}\nStatus: {}\nNote: {}", client.display_name, client.status, note)
}

/// Chronological transcript with a sender prefix per line.
pub fn transcript(history: &[Message]) -> String {
    history
        .iter()
        .map(|message| format!("[{}] {}", message.sender, message.text))
        .collect::<Vec<_>>()
        .join("\n")
}

pub const HELP_TEXT: &str = "How to work the desk:\n\
    1. Clients - list and filter clients by status\n\
    2. Open a client, then Write to client to start answering\n\
    3. Finish chat when you are done\n\
    4. Replying to a client notification also routes your answer";

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use relaydesk_core::domain::UserId;
    use relaydesk_core::{Client, ClientStatus, ClientSummary, Message, Sender};

    use super::{card_text, client_card, client_list, main_menu, status_menu, transcript};
    use crate::events::OperatorAction;

    fn message(id: i64, sender: Sender, text: &str) -> Message {
        Message {
            id,
            client_id: UserId(1),
            sender,
            text: text.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn status_menu_covers_every_filter() {
        let menu = status_menu();
        let filters: Vec<_> = menu
            .buttons()
            .filter_map(|b| match b.action {
                OperatorAction::FilterByStatus(filter) => Some(filter),
                _ => None,
            })
            .collect();

        assert_eq!(
            filters,
            vec![
                Some(ClientStatus::New),
                Some(ClientStatus::InProgress),
                Some(ClientStatus::Closed),
                None,
            ]
        );
    }

    #[test]
    fn client_list_labels_carry_name_and_status() {
        let menu = client_list(&[
            ClientSummary {
                id: UserId(1),
                display_name: "Alice".to_string(),
                status: ClientStatus::New,
            },
            ClientSummary {
                id: UserId(2),
                display_name: "Bob".to_string(),
                status: ClientStatus::Closed,
            },
        ]);

        let labels: Vec<&str> = menu.buttons().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Alice (new)", "Bob (closed)"]);
        assert!(matches!(menu.rows[0][0].action, OperatorAction::OpenClient(UserId(1))));
    }

    #[test]
    fn card_shows_dash_for_empty_note() {
        let client = Client::new(UserId(1), "Alice");
        assert_eq!(card_text(&client), "Alice\nStatus: new\nNote: -");
    }

    #[test]
    fn card_menu_targets_the_right_client() {
        let menu = client_card(UserId(7));
        assert!(menu
            .buttons()
            .any(|b| matches!(b.action, OperatorAction::WriteToClient(UserId(7)))));
        assert!(menu.buttons().any(|b| matches!(b.action, OperatorAction::Finish)));
    }

    #[test]
    fn transcript_prefixes_each_sender() {
        let rendered = transcript(&[
            message(1, Sender::Client, "hello"),
            message(2, Sender::Operator, "hi"),
        ]);
        assert_eq!(rendered, "[client] hello\n[operator] hi");
    }

    #[test]
    fn main_menu_has_one_button_per_row() {
        let menu = main_menu();
        assert_eq!(menu.rows.len(), 4);
        assert!(menu.rows.iter().all(|row| row.len() == 1));
    }
}
