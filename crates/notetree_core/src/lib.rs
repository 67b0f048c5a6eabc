//! Core domain logic for the note tree engine.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod finder;
pub mod logging;
pub mod model;
pub mod projection;
pub mod repo;

pub use finder::note_finder::{find_notes, FinderError, FinderResult};
pub use finder::options::{NoteQuery, RelatedQuery};
pub use finder::related_finder::find_related;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::ancestry::Ancestry;
pub use model::note::{
    CreatedNote, NewNote, NewUser, NoteChanges, NoteId, NoteRecord, UserId, UserRecord,
};
pub use projection::{NoteView, UserView};
pub use repo::note_store::{
    AncestryScope, NoteFilter, NoteStore, SqliteNoteStore, StoreError, StoreResult,
};
