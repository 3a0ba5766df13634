//! Invitations: a node's owner hands out a key that can be redeemed once.

use chrono::Utc;
use tracing::{debug, warn};

use crate::model::{AccountId, Invitation, NodeId};
use crate::storage::StorageBackend;
use crate::tx::TxMode;
use crate::{Error, FamilyTree, Result};

impl<B: StorageBackend> FamilyTree<B> {
    /// Open an invitation for `node` under the caller-chosen `key`.
    ///
    /// Only the node's owner may invite. Keys must be non-blank and unused
    /// by any other invitation.
    pub async fn create_invitation(
        &self,
        caller: AccountId,
        node: NodeId,
        key: &str,
    ) -> Result<Invitation> {
        if key.trim().is_empty() {
            return Err(Error::InvalidInput("Invitation key is required".into()));
        }

        let mut tx = self.backend.begin_tx(TxMode::ReadWrite).await?;
        let result = self.insert_invitation(&mut tx, caller, node, key).await;
        self.finish(tx, result).await
    }

    async fn insert_invitation(
        &self,
        tx: &mut B::Tx,
        caller: AccountId,
        node: NodeId,
        key: &str,
    ) -> Result<Invitation> {
        self.require_owned(tx, caller, node).await?;
        if self.backend.invitation_by_key(tx, key).await?.is_some() {
            return Err(Error::InvalidInput(format!("Invitation key {key:?} is already taken")));
        }

        let created = Utc::now().naive_utc();
        let invitation = self.backend.create_invitation(tx, node, key, created).await?;

        debug!(%node, id = %invitation.id, "created invitation");
        Ok(invitation)
    }

    /// Redeem the invitation stored under `key`.
    ///
    /// Unknown keys and invitations that were already redeemed are invalid input.
    pub async fn use_invitation(&self, key: &str) -> Result<Invitation> {
        let mut tx = self.backend.begin_tx(TxMode::ReadWrite).await?;
        let result = self.redeem_invitation(&mut tx, key).await;
        self.finish(tx, result).await
    }

    async fn redeem_invitation(&self, tx: &mut B::Tx, key: &str) -> Result<Invitation> {
        let invitation = self.backend.invitation_by_key(tx, key).await?
            .ok_or_else(|| Error::InvalidInput(format!("No invitation under key {key:?}")))?;

        if !invitation.is_open() {
            warn!(id = %invitation.id, "rejected reuse of invitation");
            return Err(Error::InvalidInput(format!(
                "Invitation {} has already been used", invitation.id
            )));
        }

        let used = self.backend
            .mark_invitation_used(tx, invitation.id, Utc::now().naive_utc())
            .await?;

        debug!(id = %used.id, node = %used.node, "invitation used");
        Ok(used)
    }
}
