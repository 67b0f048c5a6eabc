//! CLI smoke entry point.
//!
//! # Responsibility
//! - Exercise the core crate end to end against an in-memory database.
//! - Keep output deterministic for quick local sanity checks.

use std::error::Error;
use std::process::ExitCode;

use notetree_core::{
    db::open_db_in_memory, default_log_level, find_notes, find_related, init_logging,
    AncestryScope, NewNote, NewUser, NoteQuery, RelatedQuery, SqliteNoteStore,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("notetree_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let log_dir = std::env::temp_dir().join("notetree_cli");
    let log_dir = log_dir.to_str().ok_or("temp dir is not valid UTF-8")?;
    init_logging(default_log_level(), log_dir)?;

    let conn = open_db_in_memory()?;
    let store = SqliteNoteStore::try_new(&conn)?;

    let ada = store.create_user(&NewUser {
        name: "Ada Lovelace".to_string(),
        username: "ada".to_string(),
        email: "ada@example.com".to_string(),
        avatar_url: None,
    })?;
    let sam = store.create_user(&NewUser {
        name: "Sam Brown".to_string(),
        username: "sam".to_string(),
        email: "sam@example.com".to_string(),
        avatar_url: None,
    })?;

    let target = store.create_note(&NewNote {
        content: "Climate Change".to_string(),
        user_id: ada.id,
        ..Default::default()
    })?;
    store.create_note(&NewNote {
        content: "Reading list: [[Climate Change]] and friends".to_string(),
        user_id: sam.id,
        ..Default::default()
    })?;
    store.create_note(&NewNote {
        content: "##Climate Change weekly digest".to_string(),
        user_id: ada.id,
        ..Default::default()
    })?;

    let roots = find_notes(
        &store,
        &NoteQuery {
            user_ids: Some(vec![ada.id]),
            ancestry: AncestryScope::RootsOnly,
            ..Default::default()
        },
    )?;
    println!("roots owned by {}: {}", ada.username, roots.len());
    for view in &roots {
        println!("  note id={} slug={}", view.id, view.slug);
    }

    let related = find_related(
        &store,
        target.note.id,
        &RelatedQuery {
            authenticated_user_id: Some(ada.id),
            include_user: true,
            ..Default::default()
        },
    )?;
    println!("notes related to {}: {}", target.note.slug, related.len());
    for view in &related {
        let owner = view
            .user
            .as_ref()
            .map(|user| user.username.as_str())
            .unwrap_or("unknown");
        println!("  note id={} owner={}", view.id, owner);
    }

    Ok(())
}
