//! Criteria-based note lookup with family and owner expansion.
//!
//! # Responsibility
//! - Translate a [`NoteQuery`] into storage filters and project matches.
//! - Resolve ancestor chains and descendant subtrees for matched notes.
//!
//! # Invariants
//! - Ancestors are ordered root-first; descendants are the flattened
//!   subtree ordered by `position` (id as tie-break).
//! - Family expansion reads the forest once, so ancestors and descendants
//!   come from a single consistent view.
//! - An empty match is a successful empty sequence, never an error.

use crate::finder::options::NoteQuery;
use crate::model::note::{NoteId, NoteRecord, UserId, UserRecord};
use crate::projection::{NoteView, UserView};
use crate::repo::note_store::{NoteFilter, NoteStore, StoreError};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type FinderResult<T> = Result<T, FinderError>;

/// Finder-level error for note lookup operations.
#[derive(Debug)]
pub enum FinderError {
    /// The note a caller asked for directly does not exist.
    NoteNotFound(NoteId),
    /// Storage failure, propagated unchanged.
    Store(StoreError),
}

impl Display for FinderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(id) => write!(f, "Couldn't find Note {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FinderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NoteNotFound(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for FinderError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NoteNotFound(id) => Self::NoteNotFound(id),
            other => Self::Store(other),
        }
    }
}

/// Finds notes matching every supplied criterion and projects them.
///
/// Attached ancestors, descendants and users are resolved only when the
/// corresponding `include_*` flag is set; attached family notes are bare
/// views, nested one level.
pub fn find_notes<S: NoteStore>(store: &S, query: &NoteQuery) -> FinderResult<Vec<NoteView>> {
    let filter = NoteFilter {
        ids: query.ids.clone(),
        user_ids: query.user_ids.clone(),
        slugs: query.slugs.clone(),
        ancestry: query.ancestry,
        content_like: query.content_like.clone(),
    };
    let records = store.fetch_notes(&filter)?;
    project_with_expansions(store, &records, query)
}

fn project_with_expansions<S: NoteStore>(
    store: &S,
    records: &[NoteRecord],
    query: &NoteQuery,
) -> FinderResult<Vec<NoteView>> {
    let mut views: Vec<NoteView> = records.iter().map(NoteView::from_record).collect();

    if query.include_descendants || query.include_ancestors {
        let pool = store.fetch_notes(&NoteFilter::default())?;
        let by_id: HashMap<NoteId, &NoteRecord> =
            pool.iter().map(|record| (record.id, record)).collect();

        for (view, record) in views.iter_mut().zip(records) {
            if query.include_descendants {
                view.descendants = Some(descendants_of(record.id, &pool));
            }
            if query.include_ancestors {
                view.ancestors = Some(ancestors_of(record, &by_id));
            }
        }
    }

    if query.include_user {
        let owner_ids: Vec<UserId> = records.iter().map(|record| record.user_id).collect();
        let users = store.fetch_users(&owner_ids)?;
        let by_id: HashMap<UserId, &UserRecord> =
            users.iter().map(|user| (user.id, user)).collect();

        for (view, record) in views.iter_mut().zip(records) {
            view.user = by_id
                .get(&record.user_id)
                .copied()
                .map(UserView::from_record);
        }
    }

    Ok(views)
}

/// Flattened subtree below `id`, every depth included, ordered by position.
fn descendants_of(id: NoteId, pool: &[NoteRecord]) -> Vec<NoteView> {
    let mut subtree: Vec<&NoteRecord> = pool
        .iter()
        .filter(|record| record.ancestry.has_ancestor(id))
        .collect();
    subtree.sort_by_key(|record| (record.position, record.id));
    subtree.into_iter().map(NoteView::from_record).collect()
}

/// Ancestor chain in path order (root first). Ids missing from the pool are
/// skipped; path integrity is the write side's job.
fn ancestors_of(record: &NoteRecord, by_id: &HashMap<NoteId, &NoteRecord>) -> Vec<NoteView> {
    record
        .ancestry
        .ids()
        .iter()
        .filter_map(|ancestor_id| by_id.get(ancestor_id).copied())
        .map(NoteView::from_record)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::FinderError;
    use crate::repo::note_store::StoreError;

    #[test]
    fn not_found_message_names_the_note() {
        let err = FinderError::NoteNotFound(999);
        assert_eq!(err.to_string(), "Couldn't find Note 999");
    }

    #[test]
    fn store_not_found_remaps_to_finder_not_found() {
        let err = FinderError::from(StoreError::NoteNotFound(7));
        assert!(matches!(err, FinderError::NoteNotFound(7)));

        let err = FinderError::from(StoreError::MissingRequiredTable("notes"));
        assert!(matches!(err, FinderError::Store(_)));
    }
}
