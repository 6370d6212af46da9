//! The relay/state engine.
//!
//! Classifies every inbound event (new client, known client, operator
//! mid-session) against the per-operator session book and decides which
//! store mutations and outbound instructions follow. Operator text is
//! resolved in a fixed priority order: awaiting-note first, then the
//! active target, then quoted-reply correlation as the fallback path.

use std::sync::Arc;

use tracing::info;

use relaydesk_core::config::FanoutPolicy;
use relaydesk_core::domain::UserId;
use relaydesk_core::errors::{DomainError, EngineError};
use relaydesk_core::{Sender, SessionBook};
use relaydesk_db::repositories::{
    ClientRepository, MessageRepository, OperatorRepository, DEFAULT_HISTORY_LIMIT,
};

use crate::correlation;
use crate::events::{Inbound, OperatorAction, ReplyRef};
use crate::menus;
use crate::outbound::Outbound;

const WELCOME: &str = "Hello! Write your message and an operator will reply.";
const CLIENT_ACK: &str = "Your message has been passed to an operator.";
const OPERATOR_MENU: &str = "Operator menu.";
const MAIN_MENU: &str = "Main menu.";
const CHAT_FINISHED: &str = "Chat finished.";
const NOTE_SAVED: &str = "Note saved.";
const MESSAGE_SENT: &str = "Message sent.";
const NO_CLIENTS: &str = "No clients yet.";
const PICK_A_CLIENT: &str = "Pick a client first.";
const CHOOSE_STATUS: &str = "Filter clients by status:";

pub struct RelayRouter {
    operators: Arc<dyn OperatorRepository>,
    clients: Arc<dyn ClientRepository>,
    messages: Arc<dyn MessageRepository>,
    sessions: SessionBook,
    fanout: FanoutPolicy,
}

impl RelayRouter {
    pub fn new(
        operators: Arc<dyn OperatorRepository>,
        clients: Arc<dyn ClientRepository>,
        messages: Arc<dyn MessageRepository>,
        fanout: FanoutPolicy,
    ) -> Self {
        Self { operators, clients, messages, sessions: SessionBook::new(), fanout }
    }

    /// Handles one inbound event. Errors are per-event: the caller renders
    /// `EngineError::user_message` and keeps the loop alive.
    pub async fn handle(&mut self, event: Inbound) -> Result<Vec<Outbound>, EngineError> {
        match event {
            Inbound::Start { user_id, display_name, is_bootstrap_owner } => {
                self.handle_start(user_id, &display_name, is_bootstrap_owner).await
            }
            Inbound::Action { operator_id, action } => {
                self.handle_action(operator_id, action).await
            }
            Inbound::Text { sender_id, display_name, text, reply_to } => {
                self.handle_text(sender_id, &display_name, &text, reply_to).await
            }
        }
    }

    async fn handle_start(
        &mut self,
        user_id: UserId,
        display_name: &str,
        is_bootstrap_owner: bool,
    ) -> Result<Vec<Outbound>, EngineError> {
        self.sessions.clear(user_id);

        if is_bootstrap_owner {
            self.operators.add(user_id, true).await?;
        }

        if self.operators.is_operator(user_id).await? {
            return Ok(vec![Outbound::render(user_id, OPERATOR_MENU, menus::main_menu())]);
        }

        self.clients.get_or_create(user_id, display_name).await?;
        Ok(vec![Outbound::notify(user_id, WELCOME)])
    }

    async fn handle_action(
        &mut self,
        operator_id: UserId,
        action: OperatorAction,
    ) -> Result<Vec<Outbound>, EngineError> {
        if !self.operators.is_operator(operator_id).await? {
            return Err(EngineError::Unauthorized {
                operator: operator_id,
                action: "use the operator menu",
            });
        }

        match action {
            OperatorAction::MainMenu => {
                self.sessions.clear(operator_id);
                Ok(vec![Outbound::render(operator_id, MAIN_MENU, menus::main_menu())])
            }
            OperatorAction::Finish => {
                self.sessions.clear(operator_id);
                Ok(vec![Outbound::render(operator_id, CHAT_FINISHED, menus::main_menu())])
            }
            OperatorAction::Help => {
                Ok(vec![Outbound::render(operator_id, menus::HELP_TEXT, menus::main_menu())])
            }
            OperatorAction::ListClients => {
                Ok(vec![Outbound::render(operator_id, CHOOSE_STATUS, menus::status_menu())])
            }
            OperatorAction::FilterByStatus(filter) => {
                let clients = self.clients.list(filter).await?;
                if clients.is_empty() {
                    return Ok(vec![Outbound::render(operator_id, NO_CLIENTS, menus::main_menu())]);
                }
                Ok(vec![Outbound::render(operator_id, "Clients:", menus::client_list(&clients))])
            }
            OperatorAction::OpenClient(client_id) => {
                let client = self.clients.get(client_id).await?;
                let history = self.messages.history(client_id, DEFAULT_HISTORY_LIMIT).await?;

                let mut out = vec![Outbound::render(
                    operator_id,
                    menus::card_text(&client),
                    menus::client_card(client_id),
                )];
                if !history.is_empty() {
                    out.push(Outbound::notify(operator_id, menus::transcript(&history)));
                }
                Ok(out)
            }
            OperatorAction::WriteToClient(client_id) => {
                let client = self.clients.get(client_id).await?;
                self.sessions.open_target(operator_id, client_id);
                Ok(vec![Outbound::notify(
                    operator_id,
                    format!("Type your message to {}.", client.display_name),
                )])
            }
            OperatorAction::SetStatus(client_id, status) => {
                self.clients.set_status(client_id, status).await?;
                Ok(vec![Outbound::notify(operator_id, format!("Status set to {status}."))])
            }
            OperatorAction::AddNote(client_id) => {
                let client = self.clients.get(client_id).await?;
                self.sessions.await_note(operator_id, client_id);
                Ok(vec![Outbound::notify(
                    operator_id,
                    format!("Type the note for {}.", client.display_name),
                )])
            }
            OperatorAction::ListOperators => {
                self.require_owner(operator_id, "list operators").await?;
                let operators = self.operators.list().await?;
                let lines: Vec<String> = operators
                    .iter()
                    .map(|op| {
                        if op.is_owner {
                            format!("{} (owner)", op.id)
                        } else {
                            op.id.to_string()
                        }
                    })
                    .collect();
                Ok(vec![Outbound::render(
                    operator_id,
                    format!("Operators:\n{}", lines.join("\n")),
                    menus::main_menu(),
                )])
            }
            OperatorAction::AddOperator(new_id) => {
                self.require_owner(operator_id, "add operators").await?;
                self.operators.add(new_id, false).await?;
                Ok(vec![Outbound::notify(operator_id, format!("Operator {new_id} added."))])
            }
            OperatorAction::RemoveOperator(target_id) => {
                self.require_owner(operator_id, "remove operators").await?;
                if !self.operators.is_operator(target_id).await? {
                    return Err(DomainError::OperatorNotFound(target_id).into());
                }
                if self.operators.is_owner(target_id).await? {
                    return Ok(vec![Outbound::notify(
                        operator_id,
                        "The owner cannot be removed.",
                    )]);
                }
                self.operators.remove(target_id).await?;
                Ok(vec![Outbound::notify(operator_id, format!("Operator {target_id} removed."))])
            }
        }
    }

    async fn handle_text(
        &mut self,
        sender_id: UserId,
        display_name: &str,
        text: &str,
        reply_to: Option<ReplyRef>,
    ) -> Result<Vec<Outbound>, EngineError> {
        if self.operators.is_operator(sender_id).await? {
            return self.handle_operator_text(sender_id, text, reply_to).await;
        }
        self.handle_client_text(sender_id, display_name, text).await
    }

    async fn handle_operator_text(
        &mut self,
        operator_id: UserId,
        text: &str,
        reply_to: Option<ReplyRef>,
    ) -> Result<Vec<Outbound>, EngineError> {
        // Note entry wins over everything else, including reply detection.
        if let Some(target) = self.sessions.take_note_target(operator_id) {
            self.clients.set_note(target, text).await?;
            return Ok(vec![Outbound::render(operator_id, NOTE_SAVED, menus::main_menu())]);
        }

        if let Some(target) = self.sessions.active_target(operator_id) {
            // Session persists until the operator finishes explicitly.
            return self.relay(operator_id, target, text).await;
        }

        // Fallback: route by the quoted message's correlation. Needs no
        // transient state, so it keeps working across process restarts.
        if let Some(reply) = reply_to {
            let target = correlation::resolve(&reply)?;
            self.clients.get(target).await?;
            return self.relay(operator_id, target, text).await;
        }

        Ok(vec![Outbound::render(operator_id, PICK_A_CLIENT, menus::main_menu())])
    }

    async fn handle_client_text(
        &mut self,
        client_id: UserId,
        display_name: &str,
        text: &str,
    ) -> Result<Vec<Outbound>, EngineError> {
        let client = self.clients.get_or_create(client_id, display_name).await?;
        self.messages.append(client.id, Sender::Client, text).await?;

        info!(
            event_name = "relay.client_message_received",
            client_id = client.id.0,
            fanout = ?self.fanout,
            "client message stored and fanned out"
        );

        let notification =
            correlation::client_notification(client.id, &client.display_name, text);
        let mut out: Vec<Outbound> = self
            .notification_recipients()
            .await?
            .into_iter()
            .map(|operator| Outbound::notify_about(operator, notification.clone(), client.id))
            .collect();

        out.push(Outbound::notify(client_id, CLIENT_ACK));
        Ok(out)
    }

    async fn relay(
        &mut self,
        operator_id: UserId,
        client_id: UserId,
        text: &str,
    ) -> Result<Vec<Outbound>, EngineError> {
        self.messages.append(client_id, Sender::Operator, text).await?;

        info!(
            event_name = "relay.operator_message_relayed",
            operator_id = operator_id.0,
            client_id = client_id.0,
            "operator message relayed to client"
        );

        Ok(vec![
            Outbound::notify(client_id, text),
            Outbound::notify(operator_id, MESSAGE_SENT),
        ])
    }

    async fn notification_recipients(&self) -> Result<Vec<UserId>, EngineError> {
        let operators = self.operators.list().await?;
        let recipients = operators
            .into_iter()
            .filter(|op| match self.fanout {
                FanoutPolicy::Broadcast => true,
                FanoutPolicy::OwnerOnly => op.is_owner,
            })
            .map(|op| op.id)
            .collect();
        Ok(recipients)
    }

    async fn require_owner(
        &self,
        operator_id: UserId,
        action: &'static str,
    ) -> Result<(), EngineError> {
        if self.operators.is_owner(operator_id).await? {
            Ok(())
        } else {
            Err(EngineError::Unauthorized { operator: operator_id, action })
        }
    }
}
