//! JSON export: serialize the stored family tree.
//!
//! Writes what is stored, not what is derived: every node and every link,
//! each sorted by ID so that two exports of the same tree are byte-equal.
//!
//! ```text
//! { "nodes": [Node, ...], "relations": [Relation, ...] }
//! ```

use std::io::Write;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::*;
use crate::storage::StorageBackend;
use crate::tx::TxMode;
use crate::Result;

/// Snapshot of the stored tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyDump {
    pub nodes: Vec<Node>,
    pub relations: Vec<Relation>,
}

/// Read every node and link out of `backend`.
pub async fn collect_dump<B: StorageBackend>(backend: &B) -> Result<FamilyDump> {
    let tx = backend.begin_tx(TxMode::ReadOnly).await?;

    let mut nodes = backend.all_nodes(&tx).await?;
    nodes.sort_by_key(|n| n.id);

    // Outgoing only, so each link is seen from its source exactly once.
    let mut relations = Vec::new();
    for node in &nodes {
        relations.extend(backend.get_relations(&tx, node.id, Direction::Outgoing, None).await?);
    }
    relations.sort_by_key(|r| r.id);

    backend.commit_tx(tx).await?;
    Ok(FamilyDump { nodes, relations })
}

/// Export the stored tree as pretty-printed JSON.
pub async fn export_family_json<B: StorageBackend>(
    backend: &B,
    writer: &mut dyn Write,
) -> Result<()> {
    let dump = collect_dump(backend).await?;
    debug!(nodes = dump.nodes.len(), relations = dump.relations.len(), "exporting family tree");

    serde_json::to_writer_pretty(&mut *writer, &dump)?;
    writeln!(writer)?;
    Ok(())
}
