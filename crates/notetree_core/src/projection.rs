//! Exposed attribute shaping for notes and users.
//!
//! # Responsibility
//! - Map raw records onto the allow-listed attribute sets query results
//!   expose.
//!
//! # Invariants
//! - Every finder result passes through this module; nothing else shapes
//!   output.
//! - `UserView` exposes exactly id, name, username and avatar_url. Email and
//!   timestamps never leave the storage layer.

use crate::model::note::{NoteId, NoteRecord, UserId, UserRecord};
use serde::Serialize;

/// Exposed note attributes, with optional one-level expansions.
///
/// `ancestors`, `descendants` and `user` stay `None` unless the caller asked
/// for them; attached family notes are bare views without expansions of
/// their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteView {
    pub id: NoteId,
    pub content: String,
    pub slug: String,
    pub user_id: UserId,
    /// Encoded ancestor path (`"2/3"`), `None` for roots.
    pub ancestry: Option<String>,
    pub position: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ancestors: Option<Vec<NoteView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descendants: Option<Vec<NoteView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
}

impl NoteView {
    /// Projects one raw record with no expansions attached.
    pub fn from_record(record: &NoteRecord) -> Self {
        Self {
            id: record.id,
            content: record.content.clone(),
            slug: record.slug.clone(),
            user_id: record.user_id,
            ancestry: record.ancestry.encode(),
            position: record.position,
            ancestors: None,
            descendants: None,
            user: None,
        }
    }
}

/// Exposed user attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl UserView {
    pub fn from_record(record: &UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            username: record.username.clone(),
            avatar_url: record.avatar_url.clone(),
        }
    }
}
