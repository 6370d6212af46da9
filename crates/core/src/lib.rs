pub mod config;
pub mod domain;
pub mod errors;
pub mod session;

pub use domain::client::{Client, ClientStatus, ClientSummary};
pub use domain::message::{Message, Sender};
pub use domain::operator::Operator;
pub use domain::UserId;
pub use errors::{DomainError, EngineError};
pub use session::{SessionBook, SessionState};
