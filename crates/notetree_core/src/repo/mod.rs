//! Storage layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the read contract the finders depend on.
//! - Isolate SQLite query details from query orchestration.
//!
//! # Invariants
//! - Read APIs return semantic errors (`NoteNotFound`) in addition to DB
//!   transport errors.
//! - Ancestry paths are decoded on read and encoded on write; raw path
//!   strings never cross this boundary.

pub mod note_store;
