//! Transient per-operator session state.
//!
//! Process lifetime only, never persisted. Each operator is in exactly one
//! state at any time; the map stores a single tagged variant per operator,
//! so entering a state implicitly clears the previous one.

use std::collections::HashMap;

use crate::domain::UserId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    /// The operator's next plain-text message is captured as a note for
    /// this client, not relayed.
    AwaitingNote(UserId),
    /// The client the operator is currently composing replies to. Persists
    /// across messages until explicitly finished.
    ActiveTarget(UserId),
}

#[derive(Debug, Default)]
pub struct SessionBook {
    states: HashMap<UserId, SessionState>,
}

impl SessionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, operator: UserId) -> SessionState {
        self.states.get(&operator).copied().unwrap_or_default()
    }

    pub fn open_target(&mut self, operator: UserId, client: UserId) {
        self.states.insert(operator, SessionState::ActiveTarget(client));
    }

    pub fn await_note(&mut self, operator: UserId, client: UserId) {
        self.states.insert(operator, SessionState::AwaitingNote(client));
    }

    pub fn clear(&mut self, operator: UserId) {
        self.states.remove(&operator);
    }

    pub fn active_target(&self, operator: UserId) -> Option<UserId> {
        match self.state(operator) {
            SessionState::ActiveTarget(client) => Some(client),
            _ => None,
        }
    }

    /// If the operator was mid-entry of a note, returns the note's target
    /// and resets the operator to `Idle`.
    pub fn take_note_target(&mut self, operator: UserId) -> Option<UserId> {
        match self.state(operator) {
            SessionState::AwaitingNote(client) => {
                self.states.remove(&operator);
                Some(client)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionBook, SessionState};
    use crate::domain::UserId;

    const OP: UserId = UserId(999);
    const CLIENT_A: UserId = UserId(111);
    const CLIENT_B: UserId = UserId(222);

    #[test]
    fn unknown_operator_is_idle() {
        let book = SessionBook::new();
        assert_eq!(book.state(OP), SessionState::Idle);
        assert_eq!(book.active_target(OP), None);
    }

    #[test]
    fn entering_a_state_replaces_the_previous_one() {
        let mut book = SessionBook::new();
        book.open_target(OP, CLIENT_A);
        assert_eq!(book.state(OP), SessionState::ActiveTarget(CLIENT_A));

        book.await_note(OP, CLIENT_B);
        assert_eq!(book.state(OP), SessionState::AwaitingNote(CLIENT_B));
        assert_eq!(book.active_target(OP), None);
    }

    #[test]
    fn finish_returns_operator_to_idle() {
        let mut book = SessionBook::new();
        book.open_target(OP, CLIENT_A);
        book.clear(OP);
        assert_eq!(book.state(OP), SessionState::Idle);
    }

    #[test]
    fn take_note_target_resets_to_idle() {
        let mut book = SessionBook::new();
        book.await_note(OP, CLIENT_A);

        assert_eq!(book.take_note_target(OP), Some(CLIENT_A));
        assert_eq!(book.state(OP), SessionState::Idle);
        assert_eq!(book.take_note_target(OP), None);
    }

    #[test]
    fn operators_track_targets_independently() {
        let other = UserId(1000);
        let mut book = SessionBook::new();
        book.open_target(OP, CLIENT_A);
        book.open_target(other, CLIENT_A);

        book.clear(OP);
        assert_eq!(book.active_target(other), Some(CLIENT_A));
    }
}
