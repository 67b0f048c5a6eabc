//! Note and user domain records.
//!
//! # Responsibility
//! - Define the raw row shapes storage returns and the write inputs it
//!   accepts.
//!
//! # Invariants
//! - `NoteRecord.ancestry` is always decoded; the path string never leaves
//!   the storage layer.
//! - Raw records keep private fields (`email`, timestamps); only the
//!   projection layer decides what is exposed.

use crate::model::ancestry::Ancestry;

/// Stable note identifier, assigned by storage on creation.
pub type NoteId = i64;

/// Stable user identifier.
pub type UserId = i64;

/// Raw note row as storage returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    pub id: NoteId,
    /// Free text; the unit that link and duplicate matching operates on.
    pub content: String,
    /// URL-safe identifier, unique per owning user. Storage may reassign it
    /// on writes, so callers reconcile against the returned value.
    pub slug: String,
    pub user_id: UserId,
    /// Decoded ancestor chain. Empty for roots.
    pub ancestry: Ancestry,
    /// Sibling ordering key among notes sharing the same ancestry.
    pub position: i64,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl NoteRecord {
    /// Whether this note sits at the top of its tree.
    pub fn is_root(&self) -> bool {
        self.ancestry.is_root()
    }

    /// Direct parent id, if any.
    pub fn parent_id(&self) -> Option<NoteId> {
        self.ancestry.parent_id()
    }
}

/// Raw user row as storage returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub username: String,
    /// Never exposed through query results.
    pub email: String,
    pub avatar_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating one note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNote {
    pub content: String,
    pub user_id: UserId,
    /// Requested slug; sanitized before use. `None` derives one from
    /// content. Storage may still reassign on collision.
    pub slug: Option<String>,
    /// Parent note id; `None` creates a root.
    pub parent_id: Option<NoteId>,
    /// Explicit sibling position; `None` appends after existing siblings.
    pub position: Option<i64>,
    /// Client-supplied correlation key for not-yet-saved notes, echoed back
    /// unchanged so callers can reconcile local state.
    pub temporary_key: Option<String>,
}

/// Input for updating one note. Unset fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteChanges {
    pub content: Option<String>,
    /// Requested slug; sanitized before use and preferred over a
    /// content-derived reassignment.
    pub slug: Option<String>,
    /// `Some(None)` moves the note to the top level; `Some(Some(id))` moves
    /// it (and its whole subtree) under `id`.
    pub parent_id: Option<Option<NoteId>>,
    pub position: Option<i64>,
}

/// Input for creating one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

/// Result of a note creation, pairing the persisted row with the caller's
/// correlation key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedNote {
    pub note: NoteRecord,
    pub temporary_key: Option<String>,
}
