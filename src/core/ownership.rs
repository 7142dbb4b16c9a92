use serde::{Deserialize, Serialize};

use super::Cell;

/// Authenticated caller, as supplied by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable unique subject id
    pub id: String,
    /// Best-effort display name
    pub display_name: String,
    /// Optional avatar URI
    pub avatar_uri: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            avatar_uri: None,
        }
    }

    pub fn with_avatar(mut self, avatar_uri: impl Into<String>) -> Self {
        self.avatar_uri = Some(avatar_uri.into());
        self
    }

    /// An identity without a subject id cannot own anything
    pub fn is_authenticated(&self) -> bool {
        !self.id.trim().is_empty()
    }
}

/// Proof of who claimed a cell. Written once, never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipRecord {
    pub owner_id: String,
    pub owner_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_avatar: Option<String>,
}

impl From<&Identity> for OwnershipRecord {
    fn from(identity: &Identity) -> Self {
        Self {
            owner_id: identity.id.clone(),
            owner_name: identity.display_name.clone(),
            owner_avatar: identity.avatar_uri.clone(),
        }
    }
}

impl OwnershipRecord {
    /// Rebuild the identity that produced this record
    pub fn to_identity(&self) -> Identity {
        Identity {
            id: self.owner_id.clone(),
            display_name: self.owner_name.clone(),
            avatar_uri: self.owner_avatar.clone(),
        }
    }
}

/// A claimed cell as stored and sent over the wire:
/// `{key, row, col, ownerId, ownerName, ownerAvatar?}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub key: String,
    pub row: u32,
    pub col: u32,
    #[serde(flatten)]
    pub owner: OwnershipRecord,
}

impl Block {
    pub fn new(cell: Cell, owner: OwnershipRecord) -> Self {
        Self {
            key: cell.key(),
            row: cell.row,
            col: cell.col,
            owner,
        }
    }

    pub fn cell(&self) -> Cell {
        Cell::new(self.row, self.col)
    }
}
