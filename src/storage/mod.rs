//! # Storage Backend Trait
//!
//! The contract between the family tree (node service + kinship engine) and
//! whatever holds the nodes and links. The kinship engine only needs the
//! read side (chiefly `get_relations`) and never writes.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryBackend` | `memory` | In-memory for testing/embedding |

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use crate::model::*;
use crate::tx::{Transaction, TxMode};
use crate::Result;

pub use memory::MemoryBackend;

// ============================================================================
// Backend Configuration
// ============================================================================

/// Configuration for opening a storage backend.
#[derive(Debug, Clone, Default)]
pub enum BackendConfig {
    /// In-memory (no persistence)
    #[default]
    Memory,
}

// ============================================================================
// StorageBackend Trait
// ============================================================================

/// The storage contract.
///
/// Read methods take `&Self::Tx`; write methods take `&mut Self::Tx` and must
/// refuse read-only transactions.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// The transaction type for this backend.
    type Tx: Transaction;

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Shut down the backend, flushing any pending writes.
    async fn shutdown(&self) -> Result<()>;

    // ========================================================================
    // Transactions
    // ========================================================================

    async fn begin_tx(&self, mode: TxMode) -> Result<Self::Tx>;

    async fn commit_tx(&self, tx: Self::Tx) -> Result<()>;

    async fn rollback_tx(&self, tx: Self::Tx) -> Result<()>;

    // ========================================================================
    // Node CRUD
    // ========================================================================

    /// Store a new node and return its backend-assigned ID.
    async fn create_node(
        &self,
        tx: &mut Self::Tx,
        owner: AccountId,
        anchor: bool,
        profile: Profile,
    ) -> Result<NodeId>;

    /// Get a node by ID. Returns None if not found.
    async fn get_node(&self, tx: &Self::Tx, id: NodeId) -> Result<Option<Node>>;

    /// Replace the display fields of an existing node.
    async fn update_profile(&self, tx: &mut Self::Tx, id: NodeId, profile: Profile) -> Result<()>;

    // ========================================================================
    // Relation CRUD
    // ========================================================================

    /// Create a link between two existing nodes.
    async fn create_relation(
        &self,
        tx: &mut Self::Tx,
        src: NodeId,
        dst: NodeId,
        kind: RelationKind,
    ) -> Result<RelId>;

    async fn get_relation(&self, tx: &Self::Tx, id: RelId) -> Result<Option<Relation>>;

    // ========================================================================
    // Traversal
    // ========================================================================

    /// All relations touching `node`, filtered by direction and optionally kind.
    ///
    /// A self-link is reported once, whatever the direction.
    async fn get_relations(
        &self,
        tx: &Self::Tx,
        node: NodeId,
        dir: Direction,
        kind: Option<RelationKind>,
    ) -> Result<Vec<Relation>>;

    // ========================================================================
    // Scan
    // ========================================================================

    async fn all_nodes(&self, tx: &Self::Tx) -> Result<Vec<Node>>;

    /// Nodes created by `owner`.
    async fn nodes_by_owner(&self, tx: &Self::Tx, owner: AccountId) -> Result<Vec<Node>>;

    /// Nodes of `owner` carrying the anchor flag. Healthy data has at most one.
    ///
    /// Default: filters `nodes_by_owner`.
    async fn anchor_nodes(&self, tx: &Self::Tx, owner: AccountId) -> Result<Vec<Node>> {
        let nodes = self.nodes_by_owner(tx, owner).await?;
        Ok(nodes.into_iter().filter(|n| n.anchor).collect())
    }

    /// Every stored relation of a given kind.
    ///
    /// Default: scans all nodes and collects outgoing relations of that kind.
    async fn relations_by_kind(&self, tx: &Self::Tx, kind: RelationKind) -> Result<Vec<Relation>> {
        let mut result = Vec::new();
        let nodes = self.all_nodes(tx).await?;
        for node in &nodes {
            let rels = self.get_relations(tx, node.id, Direction::Outgoing, Some(kind)).await?;
            result.extend(rels);
        }
        Ok(result)
    }

    // ========================================================================
    // Invitations
    // ========================================================================

    /// Store an open invitation for `node`. Keys are unique across the store.
    async fn create_invitation(
        &self,
        tx: &mut Self::Tx,
        node: NodeId,
        key: &str,
        created: NaiveDateTime,
    ) -> Result<Invitation>;

    async fn invitation_by_key(&self, tx: &Self::Tx, key: &str) -> Result<Option<Invitation>>;

    /// Flag an invitation as used at `at` and return the updated record.
    async fn mark_invitation_used(
        &self,
        tx: &mut Self::Tx,
        id: InvitationId,
        at: NaiveDateTime,
    ) -> Result<Invitation>;

    // ========================================================================
    // Introspection
    // ========================================================================

    async fn node_count(&self, tx: &Self::Tx) -> Result<u64>;

    async fn relation_count(&self, tx: &Self::Tx) -> Result<u64>;
}
