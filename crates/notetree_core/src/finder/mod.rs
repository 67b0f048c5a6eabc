//! Note lookup and relationship discovery.
//!
//! # Responsibility
//! - Translate loosely-typed query options into storage filters.
//! - Resolve ancestor/descendant/user expansions for matched notes.
//! - Discover and rank notes related to a target note.
//!
//! # Invariants
//! - Finder output always passes through the projection layer.
//! - Query-parsing leniency never turns into an error; only a missing
//!   target note does.

pub mod link;
pub mod note_finder;
pub mod options;
pub mod related_finder;
