pub mod client;
pub mod message;
pub mod operator;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Platform identity. Operators and clients share the same id space:
/// both are users of the underlying messaging channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}
