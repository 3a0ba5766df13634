//! # famtree-rs: Family Tree Store with Kinship Inference
//!
//! People are stored as nodes; the only stored links are `Child`
//! (parent → child) and `Spouse` (plus an informational `Sibling`).
//! Ancestors, descendants, siblings, aunts/uncles and cousins are derived on
//! demand by the kinship engine.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `StorageBackend` is the contract between the engine and storage
//! 2. **One source of truth**: parent and child are two readings of one `Child` link
//! 3. **Read-only inference**: the kinship engine never writes and keeps no state
//! 4. **Checks before inference**: existence and ownership are settled by the
//!    node service before the engine runs
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use famtree::{AccountId, FamilyTree, Gender, LinkKind, NodeRequest, NodeUpdate};
//! use chrono::NaiveDate;
//!
//! # async fn example() -> famtree::Result<()> {
//! let tree = FamilyTree::open_memory().await?;
//! let me = AccountId(1);
//! let born = NaiveDate::from_ymd_opt(1990, 4, 2).unwrap();
//!
//! let ada = tree.create_node(me, NodeRequest::new(
//!     NodeUpdate::new("Ada", "King").born(born).gender(Gender::Female),
//! ).anchor()).await?;
//!
//! tree.create_node(me, NodeRequest::new(
//!     NodeUpdate::new("Anne", "King").born(born).gender(Gender::Female),
//! ).linked_to(ada.id, LinkKind::Parent)).await?;
//!
//! for rel in tree.anchor_family(me).await?.sorted() {
//!     println!("{} -[{}]-> {}", rel.from, rel.kind, rel.to);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Storage Backends
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | Memory | (default) | In-memory tree for testing/embedding |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod kinship;
pub mod service;
pub mod storage;
pub mod tx;
pub mod export;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Node, NodeId, AccountId, Gender, Profile,
    Relation, RelId, RelationKind, Direction,
    DerivedRelation, RelationSet,
    Invitation, InvitationId,
};

// ============================================================================
// Re-exports: Engine, Service, Storage, Transactions
// ============================================================================

pub use kinship::Kinship;
pub use service::{FamilyGraph, LinkKind, NodeLink, NodeRequest, NodeUpdate};
pub use storage::{StorageBackend, BackendConfig, MemoryBackend};
pub use tx::{Transaction, TxMode, TxId};

// ============================================================================
// Top-level FamilyTree handle
// ============================================================================

/// The primary entry point. A `FamilyTree` wraps a storage backend and
/// provides the node service and kinship queries (see `service`).
pub struct FamilyTree<B: StorageBackend> {
    backend: B,
}

impl<B: StorageBackend> FamilyTree<B> {
    /// Create a FamilyTree with the given backend.
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    /// Access the underlying backend (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Kinship engine over an explicitly managed transaction, for callers
    /// that want individual accessors or several queries on one snapshot.
    pub fn kinship<'a>(&'a self, tx: &'a B::Tx) -> Kinship<'a, B> {
        Kinship::new(&self.backend, tx)
    }

    /// Flush and close the backend.
    pub async fn shutdown(&self) -> Result<()> {
        self.backend.shutdown().await
    }
}

/// In-memory tree for testing and embedding.
impl FamilyTree<MemoryBackend> {
    pub async fn open_memory() -> Result<Self> {
        Ok(Self::with_backend(MemoryBackend::new()))
    }

    pub async fn open(config: BackendConfig) -> Result<Self> {
        match config {
            BackendConfig::Memory => Self::open_memory().await,
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("No anchor node for account {0}")]
    AnchorNotFound(AccountId),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Transaction error: {0}")]
    TxError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
