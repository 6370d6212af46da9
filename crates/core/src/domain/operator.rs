use serde::{Deserialize, Serialize};

use crate::domain::UserId;

/// A privileged user who can view and answer clients. Exactly one
/// operator is the bootstrap owner; that row is never deletable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: UserId,
    pub is_owner: bool,
}
