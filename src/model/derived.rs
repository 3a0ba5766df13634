//! Derived kinship facts produced by the inference engine.
//!
//! A `DerivedRelation` is an ordered `(from, to, kind)` triple. Two triples
//! holding the same nodes in swapped positions are different facts; the
//! engine produces them in a fixed orientation, so no normalisation happens
//! here.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use super::{NodeId, Relation, RelationKind};

/// One discovered kinship fact. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DerivedRelation {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: RelationKind,
}

impl DerivedRelation {
    pub fn new(from: NodeId, to: NodeId, kind: RelationKind) -> Self {
        Self { from, to, kind }
    }

    pub fn child(parent: NodeId, child: NodeId) -> Self {
        Self::new(parent, child, RelationKind::Child)
    }

    pub fn sibling(a: NodeId, b: NodeId) -> Self {
        Self::new(a, b, RelationKind::Sibling)
    }

    pub fn spouse(a: NodeId, b: NodeId) -> Self {
        Self::new(a, b, RelationKind::Spouse)
    }

    /// Both endpoints, in triple order.
    pub fn nodes(&self) -> [NodeId; 2] {
        [self.from, self.to]
    }
}

impl From<&Relation> for DerivedRelation {
    fn from(rel: &Relation) -> Self {
        Self::new(rel.src, rel.dst, rel.kind)
    }
}

/// Deduplicated set of derived relations, keyed by the full ordered triple.
///
/// `insert` doubles as the traversal stop test: a closure only expands
/// past an edge whose triple was not yet recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSet {
    inner: HashSet<DerivedRelation>,
}

impl RelationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the triple was not already present.
    pub fn insert(&mut self, rel: DerivedRelation) -> bool {
        self.inner.insert(rel)
    }

    pub fn contains(&self, rel: &DerivedRelation) -> bool {
        self.inner.contains(rel)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DerivedRelation> {
        self.inner.iter()
    }

    /// Set union, consuming `other`.
    pub fn union_with(&mut self, other: RelationSet) {
        self.inner.extend(other.inner);
    }

    /// Relations of a single kind.
    pub fn of_kind(&self, kind: RelationKind) -> impl Iterator<Item = &DerivedRelation> {
        self.inner.iter().filter(move |r| r.kind == kind)
    }

    /// Every node referenced by any triple, ascending and without repeats.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.inner.iter().flat_map(|r| r.nodes()).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Deterministic ordering for presentation and comparison.
    pub fn sorted(&self) -> Vec<DerivedRelation> {
        let mut out: Vec<DerivedRelation> = self.inner.iter().copied().collect();
        out.sort();
        out
    }
}

impl Extend<DerivedRelation> for RelationSet {
    fn extend<T: IntoIterator<Item = DerivedRelation>>(&mut self, iter: T) {
        self.inner.extend(iter);
    }
}

impl FromIterator<DerivedRelation> for RelationSet {
    fn from_iter<T: IntoIterator<Item = DerivedRelation>>(iter: T) -> Self {
        Self { inner: iter.into_iter().collect() }
    }
}

impl IntoIterator for RelationSet {
    type Item = DerivedRelation;
    type IntoIter = hashbrown::hash_set::IntoIter<DerivedRelation>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}
