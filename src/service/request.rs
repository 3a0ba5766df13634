//! Node write requests and their validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Gender, NodeId, Profile, RelationKind};
use crate::{Error, Result};

/// How a newly created node attaches to an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkKind {
    /// The new node is a child of the existing node.
    Child,
    /// The new node is a parent of the existing node. Stored as a `Child`
    /// link from the new node.
    Parent,
    Sibling,
    Spouse,
}

/// Link request attached to a node creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLink {
    /// The existing node.
    pub node: NodeId,
    pub kind: LinkKind,
}

impl NodeLink {
    pub fn new(node: NodeId, kind: LinkKind) -> Self {
        Self { node, kind }
    }

    /// The stored `(src, dst, kind)` once the new node has an ID.
    pub(crate) fn resolve(&self, new_node: NodeId) -> (NodeId, NodeId, RelationKind) {
        match self.kind {
            LinkKind::Child => (self.node, new_node, RelationKind::Child),
            LinkKind::Parent => (new_node, self.node, RelationKind::Child),
            LinkKind::Sibling => (self.node, new_node, RelationKind::Sibling),
            LinkKind::Spouse => (self.node, new_node, RelationKind::Spouse),
        }
    }
}

/// Editable person fields as submitted. Required fields are optional here so
/// that missing values surface as `InvalidInput` rather than a type error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeUpdate {
    pub title: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

impl NodeUpdate {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Self::default()
        }
    }

    pub fn born(mut self, date: NaiveDate) -> Self {
        self.birth_date = Some(date);
        self
    }

    pub fn gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn interests(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.interests = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Check required fields and build the stored profile.
    pub fn validate(self) -> Result<Profile> {
        if self.first_name.trim().is_empty() {
            return Err(Error::InvalidInput("First name is required".into()));
        }
        if self.last_name.trim().is_empty() {
            return Err(Error::InvalidInput("Last name is required".into()));
        }
        let birth_date = self.birth_date
            .ok_or_else(|| Error::InvalidInput("Birth date is required".into()))?;
        let gender = self.gender
            .ok_or_else(|| Error::InvalidInput("Gender is required".into()))?;

        Ok(Profile {
            title: self.title,
            first_name: self.first_name,
            last_name: self.last_name,
            birth_date,
            gender,
            address: self.address,
            phone: self.phone,
            interests: self.interests,
        })
    }
}

/// Node creation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRequest {
    #[serde(flatten)]
    pub fields: NodeUpdate,
    /// Request the anchor flag for the owning account.
    #[serde(default)]
    pub anchor: bool,
    pub link: Option<NodeLink>,
}

impl NodeRequest {
    pub fn new(fields: NodeUpdate) -> Self {
        Self { fields, anchor: false, link: None }
    }

    pub fn anchor(mut self) -> Self {
        self.anchor = true;
        self
    }

    pub fn linked_to(mut self, node: NodeId, kind: LinkKind) -> Self {
        self.link = Some(NodeLink::new(node, kind));
        self
    }
}
