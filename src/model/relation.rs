//! Stored family link (edge) between two nodes.

use serde::{Deserialize, Serialize};
use super::NodeId;

/// Opaque relation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelId(pub u64);

impl std::fmt::Display for RelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of a family link.
///
/// There is deliberately no `Parent` kind: a parent link is a `Child` edge
/// read from its target end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    /// `src` is a parent of `dst`.
    Child,
    /// Storable, but siblings are always recomputed from shared parents.
    Sibling,
    /// Partnership. Stored once, read in both directions.
    Spouse,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Child => "CHILD",
            RelationKind::Sibling => "SIBLING",
            RelationKind::Spouse => "SPOUSE",
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Traversal direction relative to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Edges where the node is `src`.
    Outgoing,
    /// Edges where the node is `dst`.
    Incoming,
    Both,
}

/// A stored, directed family link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelId,
    pub src: NodeId,
    pub dst: NodeId,
    pub kind: RelationKind,
}

impl Relation {
    pub fn new(id: RelId, src: NodeId, dst: NodeId, kind: RelationKind) -> Self {
        Self { id, src, dst, kind }
    }

    /// The "other" end of the relation from the given node.
    pub fn other_node(&self, from: NodeId) -> Option<NodeId> {
        if from == self.src { Some(self.dst) }
        else if from == self.dst { Some(self.src) }
        else { None }
    }
}
