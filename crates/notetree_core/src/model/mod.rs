//! Canonical note/user domain model.
//!
//! # Responsibility
//! - Define the raw records storage returns and the write inputs it accepts.
//! - Keep ancestry path handling in one dedicated codec type.
//!
//! # Invariants
//! - Notes form per-user forests via materialized ancestry paths.
//! - Raw records carry private fields; exposure happens in projection only.

pub mod ancestry;
pub mod note;
