//! In-memory storage backend.
//!
//! This is the reference implementation of `StorageBackend`.
//! It uses simple HashMaps protected by RwLock.
//!
//! ## Limitations
//!
//! - **No real transactions**: `commit_tx()` and `rollback_tx()` are no-ops.
//!   Writes are applied immediately. Rollback does NOT undo mutations.
//! - **Per-lookup consistency only**: each read takes its own lock, so a
//!   kinship query running next to a writer may see some of the writer's
//!   links and not others.
//!
//! Use this backend for tests, embedding, and small trees.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use parking_lot::RwLock;
use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::model::*;
use crate::tx::{Transaction, TxMode, TxId};
use crate::{Error, Result};
use super::StorageBackend;

// ============================================================================
// MemoryBackend
// ============================================================================

/// In-memory family graph storage. Cloning shares the same data.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    nodes: RwLock<HashMap<NodeId, Node>>,
    relations: RwLock<HashMap<RelId, Relation>>,
    /// node_id → relation IDs touching it
    adjacency: RwLock<HashMap<NodeId, Vec<RelId>>>,
    /// owner → node IDs (poor man's owner index)
    owner_index: RwLock<HashMap<AccountId, Vec<NodeId>>>,
    invitations: RwLock<HashMap<InvitationId, Invitation>>,
    /// invitation key → invitation ID
    invitation_keys: RwLock<HashMap<String, InvitationId>>,
    next_node_id: AtomicU64,
    next_rel_id: AtomicU64,
    next_invitation_id: AtomicU64,
    next_tx_id: AtomicU64,
    /// Begun and not yet committed or rolled back.
    open_txs: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                nodes: RwLock::new(HashMap::new()),
                relations: RwLock::new(HashMap::new()),
                adjacency: RwLock::new(HashMap::new()),
                owner_index: RwLock::new(HashMap::new()),
                invitations: RwLock::new(HashMap::new()),
                invitation_keys: RwLock::new(HashMap::new()),
                next_node_id: AtomicU64::new(1),
                next_rel_id: AtomicU64::new(1),
                next_invitation_id: AtomicU64::new(1),
                next_tx_id: AtomicU64::new(1),
                open_txs: AtomicU64::new(0),
            }),
        }
    }

    /// Transactions begun but neither committed nor rolled back.
    pub fn open_transactions(&self) -> u64 {
        self.inner.open_txs.load(Ordering::Relaxed)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MemoryTx
// ============================================================================

/// In-memory transaction (a marker carrying its mode, no real MVCC).
pub struct MemoryTx {
    id: TxId,
    mode: TxMode,
}

impl Transaction for MemoryTx {
    fn mode(&self) -> TxMode { self.mode }
    fn id(&self) -> TxId { self.id }
}

// ============================================================================
// StorageBackend impl
// ============================================================================

#[async_trait]
impl StorageBackend for MemoryBackend {
    type Tx = MemoryTx;

    async fn shutdown(&self) -> Result<()> { Ok(()) }

    async fn begin_tx(&self, mode: TxMode) -> Result<MemoryTx> {
        let id = TxId(self.inner.next_tx_id.fetch_add(1, Ordering::Relaxed));
        self.inner.open_txs.fetch_add(1, Ordering::Relaxed);
        Ok(MemoryTx { id, mode })
    }

    /// Memory backend applies writes immediately; commit only closes the tx.
    async fn commit_tx(&self, _tx: MemoryTx) -> Result<()> {
        self.inner.open_txs.fetch_sub(1, Ordering::Relaxed);
        Ok(())
    }

    /// WARNING: Mutations applied during this transaction are NOT reverted.
    async fn rollback_tx(&self, _tx: MemoryTx) -> Result<()> {
        self.inner.open_txs.fetch_sub(1, Ordering::Relaxed);
        Ok(())
    }

    // ========================================================================
    // Node CRUD
    // ========================================================================

    async fn create_node(
        &self,
        tx: &mut MemoryTx,
        owner: AccountId,
        anchor: bool,
        profile: Profile,
    ) -> Result<NodeId> {
        tx.ensure_writable()?;

        let id = NodeId(self.inner.next_node_id.fetch_add(1, Ordering::Relaxed));
        let node = Node { id, owner, anchor, profile };

        self.inner.owner_index.write().entry(owner).or_default().push(id);
        self.inner.nodes.write().insert(id, node);
        self.inner.adjacency.write().insert(id, Vec::new());

        Ok(id)
    }

    async fn get_node(&self, _tx: &MemoryTx, id: NodeId) -> Result<Option<Node>> {
        Ok(self.inner.nodes.read().get(&id).cloned())
    }

    async fn update_profile(&self, tx: &mut MemoryTx, id: NodeId, profile: Profile) -> Result<()> {
        tx.ensure_writable()?;

        let mut nodes = self.inner.nodes.write();
        let node = nodes.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Node {id}")))?;
        node.profile = profile;
        Ok(())
    }

    // ========================================================================
    // Relation CRUD
    // ========================================================================

    async fn create_relation(
        &self,
        tx: &mut MemoryTx,
        src: NodeId,
        dst: NodeId,
        kind: RelationKind,
    ) -> Result<RelId> {
        tx.ensure_writable()?;

        {
            let nodes = self.inner.nodes.read();
            if !nodes.contains_key(&src) {
                return Err(Error::NotFound(format!("Source node {src}")));
            }
            if !nodes.contains_key(&dst) {
                return Err(Error::NotFound(format!("Target node {dst}")));
            }
        }

        let id = RelId(self.inner.next_rel_id.fetch_add(1, Ordering::Relaxed));
        self.inner.relations.write().insert(id, Relation::new(id, src, dst, kind));

        // Update adjacency for both endpoints
        let mut adj = self.inner.adjacency.write();
        adj.entry(src).or_default().push(id);
        if src != dst {
            adj.entry(dst).or_default().push(id);
        }

        Ok(id)
    }

    async fn get_relation(&self, _tx: &MemoryTx, id: RelId) -> Result<Option<Relation>> {
        Ok(self.inner.relations.read().get(&id).cloned())
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    async fn get_relations(
        &self,
        _tx: &MemoryTx,
        node: NodeId,
        dir: Direction,
        kind: Option<RelationKind>,
    ) -> Result<Vec<Relation>> {
        let adj = self.inner.adjacency.read();
        let rels = self.inner.relations.read();

        let Some(rel_ids) = adj.get(&node) else {
            return Ok(Vec::new());
        };

        let result = rel_ids
            .iter()
            .filter_map(|rid| rels.get(rid))
            .filter(|rel| match dir {
                Direction::Outgoing => rel.src == node,
                Direction::Incoming => rel.dst == node,
                Direction::Both => true,
            })
            .filter(|rel| kind.is_none_or(|k| rel.kind == k))
            .cloned()
            .collect();

        Ok(result)
    }

    // ========================================================================
    // Scan
    // ========================================================================

    async fn all_nodes(&self, _tx: &MemoryTx) -> Result<Vec<Node>> {
        Ok(self.inner.nodes.read().values().cloned().collect())
    }

    async fn nodes_by_owner(&self, _tx: &MemoryTx, owner: AccountId) -> Result<Vec<Node>> {
        let idx = self.inner.owner_index.read();
        let nodes = self.inner.nodes.read();

        let ids = idx.get(&owner).map(Vec::as_slice).unwrap_or_default();
        Ok(ids.iter().filter_map(|id| nodes.get(id).cloned()).collect())
    }

    async fn relations_by_kind(&self, _tx: &MemoryTx, kind: RelationKind) -> Result<Vec<Relation>> {
        Ok(self.inner.relations.read()
            .values()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect())
    }

    // ========================================================================
    // Invitations
    // ========================================================================

    async fn create_invitation(
        &self,
        tx: &mut MemoryTx,
        node: NodeId,
        key: &str,
        created: NaiveDateTime,
    ) -> Result<Invitation> {
        tx.ensure_writable()?;

        if !self.inner.nodes.read().contains_key(&node) {
            return Err(Error::NotFound(format!("Node {node}")));
        }

        let mut keys = self.inner.invitation_keys.write();
        if keys.contains_key(key) {
            return Err(Error::ConstraintViolation(format!("Invitation key {key:?} already exists")));
        }

        let id = InvitationId(self.inner.next_invitation_id.fetch_add(1, Ordering::Relaxed));
        let invitation = Invitation {
            id,
            node,
            key: key.to_owned(),
            used: false,
            created,
            used_at: None,
        };
        keys.insert(key.to_owned(), id);
        self.inner.invitations.write().insert(id, invitation.clone());

        Ok(invitation)
    }

    async fn invitation_by_key(&self, _tx: &MemoryTx, key: &str) -> Result<Option<Invitation>> {
        let keys = self.inner.invitation_keys.read();
        let invitations = self.inner.invitations.read();
        Ok(keys.get(key).and_then(|id| invitations.get(id)).cloned())
    }

    async fn mark_invitation_used(
        &self,
        tx: &mut MemoryTx,
        id: InvitationId,
        at: NaiveDateTime,
    ) -> Result<Invitation> {
        tx.ensure_writable()?;

        let mut invitations = self.inner.invitations.write();
        let invitation = invitations
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Invitation {id}")))?;
        invitation.used = true;
        invitation.used_at = Some(at);
        Ok(invitation.clone())
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    async fn node_count(&self, _tx: &MemoryTx) -> Result<u64> {
        Ok(self.inner.nodes.read().len() as u64)
    }

    async fn relation_count(&self, _tx: &MemoryTx) -> Result<u64> {
        Ok(self.inner.relations.read().len() as u64)
    }
}

// ============================================================================
// Tests
// ============================================================================
