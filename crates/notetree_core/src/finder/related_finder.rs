//! Related-note discovery, ranking and enrichment.
//!
//! # Responsibility
//! - Find notes that reference a target through inline links or duplicate a
//!   root note's content.
//! - Rank matches into ownership tiers and enrich them on request.
//!
//! # Invariants
//! - The target note itself never appears in its own related set.
//! - Matches are scanned in `id ASC` order, so tier contents are stable
//!   across repeated calls.
//! - Duplicate-content matches are limited to root notes; link matches may
//!   sit anywhere in a tree.

use crate::finder::link::LinkMatcher;
use crate::finder::note_finder::{find_notes, FinderResult};
use crate::finder::options::{NoteQuery, RelatedQuery};
use crate::model::note::{NoteId, UserId};
use crate::projection::NoteView;
use crate::repo::note_store::{NoteFilter, NoteStore};
use std::collections::HashMap;

/// Finds notes related to `note_id`, ranked by ownership tier.
///
/// A note is related when it references the target's content as
/// `[[content]]` or `##content` (case-insensitive, any tree position), or
/// when it is a root note whose whole content equals the target's
/// (case-insensitive). Results are ordered: authenticated user's notes,
/// then the target owner's, then everyone else's.
///
/// Fails with [`FinderError::NoteNotFound`] when the target does not exist.
///
/// [`FinderError::NoteNotFound`]: crate::finder::note_finder::FinderError
pub fn find_related<S: NoteStore>(
    store: &S,
    note_id: NoteId,
    query: &RelatedQuery,
) -> FinderResult<Vec<NoteView>> {
    let target = store.fetch_note(note_id)?;
    let matcher = LinkMatcher::new(&target.content);

    // One pass over the forest: each note is classified once, so the union
    // of the link and duplicate branches needs no separate dedupe step.
    let pool = store.fetch_notes(&NoteFilter::default())?;
    let mut matches: Vec<(NoteId, UserId)> = Vec::new();
    for record in &pool {
        if record.id == target.id {
            continue;
        }
        let linked = matcher.links_to_target(&record.content);
        let duplicated = record.is_root() && matcher.duplicates_target(&record.content);
        if linked || duplicated {
            matches.push((record.id, record.user_id));
        }
    }

    let ranked = rank_by_owner(&matches, query.authenticated_user_id, target.user_id);
    if ranked.is_empty() {
        return Ok(Vec::new());
    }

    let enrich = NoteQuery {
        ids: Some(ranked.clone()),
        include_user: query.include_user,
        include_descendants: query.include_descendants,
        include_ancestors: query.include_ancestors,
        ..NoteQuery::default()
    };
    let mut views = find_notes(store, &enrich)?;

    let rank_index: HashMap<NoteId, usize> = ranked
        .iter()
        .enumerate()
        .map(|(index, id)| (*id, index))
        .collect();
    views.sort_by_key(|view| rank_index.get(&view.id).copied().unwrap_or(usize::MAX));
    Ok(views)
}

/// Stable three-tier partition: authenticated user's notes, then the target
/// owner's, then the rest. Input order is preserved within each tier.
///
/// When the authenticated user is the target's owner the first branch
/// captures their notes, so the tiers collapse without duplication.
fn rank_by_owner(
    matches: &[(NoteId, UserId)],
    authenticated_user_id: Option<UserId>,
    target_owner_id: UserId,
) -> Vec<NoteId> {
    let mut authenticated = Vec::new();
    let mut owner = Vec::new();
    let mut rest = Vec::new();

    for &(note_id, note_owner_id) in matches {
        if authenticated_user_id == Some(note_owner_id) {
            authenticated.push(note_id);
        } else if note_owner_id == target_owner_id {
            owner.push(note_id);
        } else {
            rest.push(note_id);
        }
    }

    let mut ranked = authenticated;
    ranked.extend(owner);
    ranked.extend(rest);
    ranked
}

#[cfg(test)]
mod tests {
    use super::rank_by_owner;

    #[test]
    fn tiers_concatenate_authenticated_then_owner_then_rest() {
        let matches = [(1, 30), (2, 10), (3, 20), (4, 10), (5, 20)];
        let ranked = rank_by_owner(&matches, Some(10), 20);
        assert_eq!(ranked, vec![2, 4, 3, 5, 1]);
    }

    #[test]
    fn owner_tier_collapses_when_authenticated_is_the_owner() {
        let matches = [(1, 30), (2, 20), (3, 20)];
        let ranked = rank_by_owner(&matches, Some(20), 20);
        assert_eq!(ranked, vec![2, 3, 1]);
    }

    #[test]
    fn without_identity_the_owner_tier_leads() {
        let matches = [(1, 30), (2, 20)];
        let ranked = rank_by_owner(&matches, None, 20);
        assert_eq!(ranked, vec![2, 1]);
    }

    #[test]
    fn input_order_is_preserved_within_each_tier() {
        let matches = [(9, 30), (7, 30), (8, 30)];
        let ranked = rank_by_owner(&matches, Some(1), 2);
        assert_eq!(ranked, vec![9, 7, 8]);
    }
}
