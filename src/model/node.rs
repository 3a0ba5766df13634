//! Person node in the family graph.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Opaque node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the account that owns (created) a node.
///
/// Resolving an authenticated caller to an account happens outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u64);

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

/// Display fields of a person. Owned and edited by the node's account only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub title: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Free-text interest tags.
    pub interests: Vec<String>,
}

impl Profile {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        birth_date: NaiveDate,
        gender: Gender,
    ) -> Self {
        Self {
            title: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            birth_date,
            gender,
            address: None,
            phone: None,
            interests: Vec::new(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// How many of the eight profile fields carry a value.
    ///
    /// Text fields count only when they hold non-whitespace text; interests
    /// count when the list is non-empty. Birth date and gender are always set.
    pub fn filled_fields(&self) -> usize {
        let has_text = |s: &str| !s.trim().is_empty();
        let optional_text = |s: &Option<String>| s.as_deref().is_some_and(has_text);

        [
            optional_text(&self.title),
            has_text(&self.first_name),
            has_text(&self.last_name),
            true, // birth_date
            true, // gender
            optional_text(&self.address),
            optional_text(&self.phone),
            !self.interests.is_empty(),
        ]
        .into_iter()
        .filter(|filled| *filled)
        .count()
    }
}

/// A person record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub owner: AccountId,
    /// Marks the account's own representation in the tree. At most one per owner.
    pub anchor: bool,
    pub profile: Profile,
}

impl Node {
    pub fn is_owned_by(&self, account: AccountId) -> bool {
        self.owner == account
    }
}
