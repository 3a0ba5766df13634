//! Transaction handles.
//!
//! Every storage call runs inside a transaction obtained from the backend.
//! Kinship queries only ever need `ReadOnly`; node and relation writes require
//! `ReadWrite` and backends reject them otherwise.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Transaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxMode {
    ReadOnly,
    ReadWrite,
}

/// Opaque transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub u64);

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tx-{}", self.0)
    }
}

/// Transaction trait that all backends must implement.
pub trait Transaction: Send + Sync {
    fn mode(&self) -> TxMode;
    fn id(&self) -> TxId;

    /// Fails with `Error::TxError` unless the transaction may write.
    fn ensure_writable(&self) -> Result<()> {
        match self.mode() {
            TxMode::ReadWrite => Ok(()),
            TxMode::ReadOnly => Err(Error::TxError(format!(
                "{} is read-only", self.id()
            ))),
        }
    }
}
