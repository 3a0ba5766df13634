//! # Kinship Inference
//!
//! Derives extended family facts from the two stored link kinds that carry
//! meaning for traversal: `Child` (directed, parent → child) and `Spouse`
//! (read in both directions). Stored `Sibling` links are never consulted;
//! siblings are always recomputed from shared parents.
//!
//! Every result is expressed with the stored kinds only. There is no
//! `Parent`, `Uncle` or `Cousin` kind; an aunt/uncle shows up as a
//! `(parent, parent's sibling, Sibling)` triple and labelling is left to
//! the caller.
//!
//! ## Layers
//!
//! | Layer | Operations |
//! |-------|------------|
//! | Primitive | `direct_children`, `direct_parents`, `siblings`, `spouses` |
//! | Closure | `ancestor_relations`, `descendant_relations` |
//! | Derived | `uncles_and_aunts`, `cousins` |
//! | Aggregate | `family_relations` |
//!
//! The engine is read-only and holds no state between calls. Missing nodes
//! and nodes without links produce empty results; the only errors are those
//! raised by the backend.

use hashbrown::HashSet;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::model::*;
use crate::storage::StorageBackend;
use crate::Result;

/// Parents of one node. Two in almost every tree.
pub type ParentList = SmallVec<[NodeId; 2]>;

/// Kinship queries bound to a backend and an open transaction.
pub struct Kinship<'a, B: StorageBackend> {
    backend: &'a B,
    tx: &'a B::Tx,
}

impl<'a, B: StorageBackend> Kinship<'a, B> {
    pub fn new(backend: &'a B, tx: &'a B::Tx) -> Self {
        Self { backend, tx }
    }

    // ========================================================================
    // Primitive accessors
    // ========================================================================

    /// Targets of `Child` links leaving `node`.
    pub async fn direct_children(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let rels = self.child_links(node, Direction::Outgoing).await?;
        Ok(rels.into_iter().map(|r| r.dst).collect())
    }

    /// Sources of `Child` links arriving at `node`.
    pub async fn direct_parents(&self, node: NodeId) -> Result<ParentList> {
        let rels = self.child_links(node, Direction::Incoming).await?;
        Ok(rels.into_iter().map(|r| r.src).collect())
    }

    /// Children of any of `node`'s parents, excluding `node`, in first-seen order.
    ///
    /// Half-siblings are not distinguished from full siblings. A node with no
    /// known parents has no siblings.
    pub async fn siblings(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let parents = self.direct_parents(node).await?;

        let mut seen = HashSet::new();
        let mut siblings = Vec::new();
        for parent in parents {
            for child in self.direct_children(parent).await? {
                if child != node && seen.insert(child) {
                    siblings.push(child);
                }
            }
        }
        Ok(siblings)
    }

    /// Partners of `node`, whichever end the `Spouse` link was stored from.
    pub async fn spouses(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let rels = self.spouse_links(node).await?;

        let mut seen = HashSet::new();
        Ok(rels
            .iter()
            .filter_map(|r| r.other_node(node))
            .filter(|other| *other != node && seen.insert(*other))
            .collect())
    }

    // ========================================================================
    // Closures
    // ========================================================================

    /// Every `Child` link on any upward path from `node`, as `(parent, child, Child)`.
    pub async fn ancestor_relations(&self, node: NodeId) -> Result<RelationSet> {
        let mut relations = RelationSet::new();
        self.collect_closure(node, Direction::Incoming, &mut relations).await?;
        debug!(%node, relations = relations.len(), "ancestor closure");
        Ok(relations)
    }

    /// Every `Child` link on any downward path from `node`, as `(parent, child, Child)`.
    pub async fn descendant_relations(&self, node: NodeId) -> Result<RelationSet> {
        let mut relations = RelationSet::new();
        self.collect_closure(node, Direction::Outgoing, &mut relations).await?;
        debug!(%node, relations = relations.len(), "descendant closure");
        Ok(relations)
    }

    /// Worklist walk along `Child` links in `dir`, accumulating into `acc`.
    ///
    /// A link is expanded only when its triple is newly inserted, so each
    /// link is followed at most once and cycles terminate. Nodes reachable
    /// along several lines are still reported through every link.
    async fn collect_closure(
        &self,
        root: NodeId,
        dir: Direction,
        acc: &mut RelationSet,
    ) -> Result<()> {
        let mut pending = vec![root];

        while let Some(current) = pending.pop() {
            for rel in self.child_links(current, dir).await? {
                if !acc.insert(DerivedRelation::from(&rel)) {
                    trace!(src = %rel.src, dst = %rel.dst, "link already recorded, branch stops");
                    continue;
                }
                let next = match dir {
                    Direction::Incoming => rel.src,
                    _ => rel.dst,
                };
                pending.push(next);
            }
        }

        Ok(())
    }

    // ========================================================================
    // Derived kinship
    // ========================================================================

    /// `(parent, parent's sibling, Sibling)` for every parent of `node`.
    pub async fn uncles_and_aunts(&self, node: NodeId) -> Result<RelationSet> {
        let mut relations = RelationSet::new();
        for parent in self.direct_parents(node).await? {
            for sibling in self.siblings(parent).await? {
                relations.insert(DerivedRelation::sibling(parent, sibling));
            }
        }
        Ok(relations)
    }

    /// Full descendant closure of every aunt and uncle of `node`.
    ///
    /// This reaches past first cousins to their children and further down.
    pub async fn cousins(&self, node: NodeId) -> Result<RelationSet> {
        let mut relations = RelationSet::new();
        for parent in self.direct_parents(node).await? {
            for aunt_or_uncle in self.siblings(parent).await? {
                // A shared accumulator yields the same union as one closure
                // per aunt/uncle: any recorded link already had its subtree walked.
                self.collect_closure(aunt_or_uncle, Direction::Outgoing, &mut relations).await?;
            }
        }
        debug!(%node, relations = relations.len(), "cousin closure");
        Ok(relations)
    }

    // ========================================================================
    // Aggregate
    // ========================================================================

    /// Union of ancestors, descendants, aunts/uncles, cousins, and the stored
    /// `Spouse` links touching `node` in either direction.
    pub async fn family_relations(&self, node: NodeId) -> Result<RelationSet> {
        let mut all = self.ancestor_relations(node).await?;
        all.union_with(self.descendant_relations(node).await?);
        all.union_with(self.uncles_and_aunts(node).await?);
        all.union_with(self.cousins(node).await?);
        all.extend(self.spouse_links(node).await?.iter().map(DerivedRelation::from));

        debug!(%node, relations = all.len(), "family relations");
        Ok(all)
    }

    // ========================================================================
    // Edge store access
    // ========================================================================

    async fn child_links(&self, node: NodeId, dir: Direction) -> Result<Vec<Relation>> {
        self.backend
            .get_relations(self.tx, node, dir, Some(RelationKind::Child))
            .await
    }

    async fn spouse_links(&self, node: NodeId) -> Result<Vec<Relation>> {
        self.backend
            .get_relations(self.tx, node, Direction::Both, Some(RelationKind::Spouse))
            .await
    }
}
