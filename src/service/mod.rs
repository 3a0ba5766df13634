//! # Node Service
//!
//! Everything around the kinship engine that touches ownership or writes:
//! node CRUD, the one-anchor-per-account rule, relation linking, invitations,
//! and the existence checks that run before a kinship query.
//!
//! Each operation runs in its own backend transaction, committed on success
//! and rolled back on any error.
//!
//! The caller's account is passed in already resolved; authentication lives
//! outside this crate.

pub mod invitation;
pub mod request;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::kinship::Kinship;
use crate::model::*;
use crate::storage::StorageBackend;
use crate::tx::TxMode;
use crate::{Error, FamilyTree, Result};

pub use request::{LinkKind, NodeLink, NodeRequest, NodeUpdate};

/// Aggregated relations of one node with every referenced node resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyGraph {
    pub root: NodeId,
    /// Referenced nodes, ascending by ID.
    pub members: Vec<Node>,
    /// Sorted relation triples.
    pub relations: Vec<DerivedRelation>,
}

impl FamilyGraph {
    pub fn member(&self, id: NodeId) -> Option<&Node> {
        self.members.iter().find(|n| n.id == id)
    }
}

// ============================================================================
// Node CRUD
// ============================================================================

impl<B: StorageBackend> FamilyTree<B> {
    /// Create a node owned by `owner`, optionally linked to an existing node.
    pub async fn create_node(&self, owner: AccountId, request: NodeRequest) -> Result<Node> {
        let NodeRequest { fields, anchor, link } = request;
        let profile = fields.validate()?;

        let mut tx = self.backend.begin_tx(TxMode::ReadWrite).await?;
        let result = self.insert_node(&mut tx, owner, anchor, profile, link).await;
        self.finish(tx, result).await
    }

    async fn insert_node(
        &self,
        tx: &mut B::Tx,
        owner: AccountId,
        anchor: bool,
        profile: Profile,
        link: Option<NodeLink>,
    ) -> Result<Node> {
        if anchor {
            self.ensure_anchor_free(tx, owner).await?;
        }
        if let Some(link) = &link {
            self.require_node(tx, link.node).await?;
        }

        let id = self.backend.create_node(tx, owner, anchor, profile).await?;

        if let Some(link) = link {
            let (src, dst, kind) = link.resolve(id);
            let rel = self.backend.create_relation(tx, src, dst, kind).await?;
            debug!(%id, %rel, %kind, "linked new node");
        }

        debug!(%id, %owner, anchor, "created node");
        self.require_node(tx, id).await
    }

    pub async fn node(&self, id: NodeId) -> Result<Node> {
        let tx = self.backend.begin_tx(TxMode::ReadOnly).await?;
        let result = self.require_node(&tx, id).await;
        self.finish(tx, result).await
    }

    /// Whether `id` is its owner's anchor node.
    pub async fn is_anchor(&self, id: NodeId) -> Result<bool> {
        Ok(self.node(id).await?.anchor)
    }

    /// Number of profile fields of `id` that carry a value (out of eight).
    pub async fn filled_fields(&self, id: NodeId) -> Result<usize> {
        Ok(self.node(id).await?.profile.filled_fields())
    }

    /// All nodes, ascending by ID.
    pub async fn nodes(&self) -> Result<Vec<Node>> {
        let tx = self.backend.begin_tx(TxMode::ReadOnly).await?;
        let result = self.backend.all_nodes(&tx).await;
        let mut nodes = self.finish(tx, result).await?;
        nodes.sort_by_key(|n| n.id);
        Ok(nodes)
    }

    /// Nodes created by `owner`, ascending by ID.
    pub async fn nodes_owned_by(&self, owner: AccountId) -> Result<Vec<Node>> {
        let tx = self.backend.begin_tx(TxMode::ReadOnly).await?;
        let result = self.backend.nodes_by_owner(&tx, owner).await;
        let mut nodes = self.finish(tx, result).await?;
        nodes.sort_by_key(|n| n.id);
        Ok(nodes)
    }

    /// Replace the display fields of a node owned by `caller`.
    ///
    /// The owner and the anchor flag are not editable.
    pub async fn update_node(&self, caller: AccountId, id: NodeId, update: NodeUpdate) -> Result<Node> {
        let profile = update.validate()?;

        let mut tx = self.backend.begin_tx(TxMode::ReadWrite).await?;
        let result = self.replace_profile(&mut tx, caller, id, profile).await;
        self.finish(tx, result).await
    }

    async fn replace_profile(
        &self,
        tx: &mut B::Tx,
        caller: AccountId,
        id: NodeId,
        profile: Profile,
    ) -> Result<Node> {
        let node = self.require_owned(tx, caller, id).await?;
        self.backend.update_profile(tx, node.id, profile).await?;

        debug!(%id, "updated node");
        self.require_node(tx, id).await
    }

    /// The node `owner` designated as itself.
    pub async fn anchor_node(&self, owner: AccountId) -> Result<Node> {
        let tx = self.backend.begin_tx(TxMode::ReadOnly).await?;
        let result = self.backend.anchor_nodes(&tx, owner).await;
        let mut anchors = self.finish(tx, result).await?;

        match anchors.len() {
            0 => Err(Error::AnchorNotFound(owner)),
            1 => Ok(anchors.remove(0)),
            n => Err(Error::ConstraintViolation(format!(
                "Account {owner} has {n} anchor nodes"
            ))),
        }
    }

    // ========================================================================
    // Relations
    // ========================================================================

    /// Store a link between two existing nodes.
    ///
    /// `caller` must own at least one endpoint. Self-links are refused.
    pub async fn relate(
        &self,
        caller: AccountId,
        from: NodeId,
        to: NodeId,
        kind: RelationKind,
    ) -> Result<Relation> {
        if from == to {
            return Err(Error::InvalidInput(format!("Node {from} cannot be linked to itself")));
        }

        let mut tx = self.backend.begin_tx(TxMode::ReadWrite).await?;
        let result = self.link(&mut tx, caller, from, to, kind).await;
        self.finish(tx, result).await
    }

    async fn link(
        &self,
        tx: &mut B::Tx,
        caller: AccountId,
        from: NodeId,
        to: NodeId,
        kind: RelationKind,
    ) -> Result<Relation> {
        let a = self.require_node(tx, from).await?;
        let b = self.require_node(tx, to).await?;
        if !a.is_owned_by(caller) && !b.is_owned_by(caller) {
            warn!(%from, %to, %caller, "rejected link between foreign nodes");
            return Err(Error::Unauthorized(format!(
                "Account {caller} owns neither node {from} nor node {to}"
            )));
        }

        let id = self.backend.create_relation(tx, from, to, kind).await?;
        let rel = self.backend.get_relation(tx, id).await?
            .ok_or_else(|| Error::StorageError(format!("Relation {id} vanished after insert")))?;

        debug!(%from, %to, %kind, "stored relation");
        Ok(rel)
    }

    // ========================================================================
    // Kinship queries
    // ========================================================================

    /// Every derived relation of an existing node.
    pub async fn family_relations(&self, node: NodeId) -> Result<RelationSet> {
        let tx = self.backend.begin_tx(TxMode::ReadOnly).await?;
        let result = self.checked_family(&tx, node).await;
        self.finish(tx, result).await
    }

    async fn checked_family(&self, tx: &B::Tx, node: NodeId) -> Result<RelationSet> {
        self.require_node(tx, node).await?;
        Kinship::new(&self.backend, tx).family_relations(node).await
    }

    /// Derived relations of `owner`'s anchor node.
    pub async fn anchor_family(&self, owner: AccountId) -> Result<RelationSet> {
        let anchor = self.anchor_node(owner).await?;
        self.family_relations(anchor.id).await
    }

    /// Derived relations of `node` together with the nodes they reference.
    ///
    /// The root is always a member, even when it has no relations.
    pub async fn family_graph(&self, node: NodeId) -> Result<FamilyGraph> {
        let tx = self.backend.begin_tx(TxMode::ReadOnly).await?;
        let result = self.hydrate_family(&tx, node).await;
        self.finish(tx, result).await
    }

    async fn hydrate_family(&self, tx: &B::Tx, node: NodeId) -> Result<FamilyGraph> {
        let root = self.require_node(tx, node).await?;
        let relations = Kinship::new(&self.backend, tx).family_relations(node).await?;

        let mut members = vec![root];
        for id in relations.node_ids() {
            if id == node {
                continue;
            }
            // A node deleted out from under the links is left out rather than failing.
            if let Some(member) = self.backend.get_node(tx, id).await? {
                members.push(member);
            }
        }

        members.sort_by_key(|n| n.id);
        Ok(FamilyGraph { root: node, members, relations: relations.sorted() })
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Commit `tx` when `result` is a success, roll it back otherwise.
    async fn finish<T>(&self, tx: B::Tx, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.backend.commit_tx(tx).await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self.backend.rollback_tx(tx).await {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn require_node(&self, tx: &B::Tx, id: NodeId) -> Result<Node> {
        self.backend.get_node(tx, id).await?
            .ok_or_else(|| Error::NotFound(format!("Node {id}")))
    }

    /// The node `id`, provided `caller` owns it.
    async fn require_owned(&self, tx: &B::Tx, caller: AccountId, id: NodeId) -> Result<Node> {
        let node = self.require_node(tx, id).await?;
        if !node.is_owned_by(caller) {
            warn!(%id, %caller, owner = %node.owner, "rejected mutation of foreign node");
            return Err(Error::Unauthorized(format!("Node {id} is not owned by account {caller}")));
        }
        Ok(node)
    }

    /// Check-then-write guard for the one-anchor-per-account rule.
    async fn ensure_anchor_free(&self, tx: &B::Tx, owner: AccountId) -> Result<()> {
        let anchors = self.backend.anchor_nodes(tx, owner).await?;
        if !anchors.is_empty() {
            warn!(%owner, "rejected second anchor node");
            return Err(Error::InvalidInput(format!("Account {owner} already has an anchor node")));
        }
        Ok(())
    }
}
