//! Relay engine and presentation boundary.
//!
//! This crate decides, for every inbound chat event, what the store should
//! record and what must be sent back out:
//! - **Events** (`events`) - inbound event and operator action types
//! - **Router** (`router`) - the relay/state engine, the heart of the system
//! - **Menus** (`menus`) - keyboard/menu builders for operator screens
//! - **Correlation** (`correlation`) - reply-target side channel
//! - **Transport** (`transport`, `runner`) - delivery boundary and event loop
//!
//! # Architecture
//!
//! ```text
//! Inbound event -> RelayRouter (sessions + store) -> Vec<Outbound> -> ChatTransport
//! ```
//!
//! The router mutates the store first and hands delivery instructions to
//! the transport afterwards; a delivery failure never rolls back state.

pub mod correlation;
pub mod events;
pub mod menus;
pub mod outbound;
pub mod router;
pub mod runner;
pub mod transport;

pub use events::{Inbound, OperatorAction, ReplyRef};
pub use outbound::{Menu, MenuButton, Outbound};
pub use router::RelayRouter;
pub use runner::{EventSource, NoopEventSource, PollingRunner, ReconnectPolicy, SourceError};
pub use transport::{ChatTransport, NoopTransport, TransportError};
