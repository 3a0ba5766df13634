//! Single-use invitation attached to a node.
//!
//! The key is chosen by the caller; generating unique keys is out of scope here.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::NodeId;

/// Opaque invitation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InvitationId(pub u64);

impl std::fmt::Display for InvitationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An invitation to claim `node`. Becomes `used` exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: InvitationId,
    pub node: NodeId,
    pub key: String,
    pub used: bool,
    pub created: NaiveDateTime,
    /// Set when the invitation is consumed.
    pub used_at: Option<NaiveDateTime>,
}

impl Invitation {
    pub fn is_open(&self) -> bool {
        !self.used
    }
}
