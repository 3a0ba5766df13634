//! # Family Graph Model
//!
//! Plain DTOs shared by storage, the kinship engine, and the node service.
//!
//! Design rule: this module is pure data: no I/O, no state, no async.

pub mod node;
pub mod relation;
pub mod derived;
pub mod invitation;

pub use node::{Node, NodeId, AccountId, Gender, Profile};
pub use relation::{Relation, RelId, RelationKind, Direction};
pub use derived::{DerivedRelation, RelationSet};
pub use invitation::{Invitation, InvitationId};
