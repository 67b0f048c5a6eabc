//! Materialized ancestry path codec.
//!
//! # Responsibility
//! - Convert between the stored slash-joined path and an ordered id list.
//! - Derive child paths and rewrite descendant paths on subtree moves.
//!
//! # Invariants
//! - Decoded ids are ordered root-first; the last id is the direct parent.
//! - An empty path means the note is a root.
//! - Decoding never fails; unreadable segments are dropped.

use crate::model::note::NoteId;

/// Ordered ancestor chain locating one note inside its tree.
///
/// The storage layer persists this as a slash-joined string (`"2/3"`) in a
/// nullable column, where `NULL` marks a root. Everything above storage works
/// on the decoded list, so traversal code never touches the string form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Ancestry {
    ids: Vec<NoteId>,
}

impl Ancestry {
    /// Path of a root note (no ancestors).
    pub fn root() -> Self {
        Self { ids: Vec::new() }
    }

    /// Builds a path from an already ordered root-first id list.
    pub fn from_ids(ids: Vec<NoteId>) -> Self {
        Self { ids }
    }

    /// Decodes the stored column value. `None` and blank strings are roots.
    pub fn decode(raw: Option<&str>) -> Self {
        let ids = raw
            .unwrap_or("")
            .split('/')
            .filter_map(|segment| segment.trim().parse::<NoteId>().ok())
            .collect();
        Self { ids }
    }

    /// Encodes back to the stored column value. Roots encode to `None`.
    pub fn encode(&self) -> Option<String> {
        if self.ids.is_empty() {
            return None;
        }
        let segments = self
            .ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>();
        Some(segments.join("/"))
    }

    /// Path for direct children of a note whose own path is `self`.
    pub fn child(&self, parent_id: NoteId) -> Self {
        let mut ids = self.ids.clone();
        ids.push(parent_id);
        Self { ids }
    }

    /// Whether this path places the note at the top of its tree.
    pub fn is_root(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether `id` occurs anywhere in this path.
    ///
    /// True for every note inside the subtree rooted at `id`, regardless of
    /// depth.
    pub fn has_ancestor(&self, id: NoteId) -> bool {
        self.ids.contains(&id)
    }

    /// Direct parent id, if any.
    pub fn parent_id(&self) -> Option<NoteId> {
        self.ids.last().copied()
    }

    /// Nesting depth. Roots are at depth 0.
    pub fn depth(&self) -> usize {
        self.ids.len()
    }

    /// Ancestor ids ordered root-first.
    pub fn ids(&self) -> &[NoteId] {
        &self.ids
    }

    /// Rewrites a descendant path after the subtree rooted at `moved_id` is
    /// re-parented. `new_base` is the moved note's own new path. Paths that do
    /// not contain `moved_id` are returned unchanged.
    pub fn rebase(&self, moved_id: NoteId, new_base: &Ancestry) -> Self {
        match self.ids.iter().position(|&id| id == moved_id) {
            Some(index) => {
                let mut ids = new_base.ids.clone();
                ids.push(moved_id);
                ids.extend_from_slice(&self.ids[index + 1..]);
                Self { ids }
            }
            None => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Ancestry;

    #[test]
    fn decode_handles_null_blank_and_joined_paths() {
        assert!(Ancestry::decode(None).is_root());
        assert!(Ancestry::decode(Some("")).is_root());
        assert_eq!(Ancestry::decode(Some("2/3")).ids(), &[2, 3]);
        assert_eq!(Ancestry::decode(Some("7")).ids(), &[7]);
    }

    #[test]
    fn decode_drops_unreadable_segments() {
        assert_eq!(Ancestry::decode(Some("2//3")).ids(), &[2, 3]);
        assert_eq!(Ancestry::decode(Some("2/x/3")).ids(), &[2, 3]);
        assert!(Ancestry::decode(Some("abc")).is_root());
    }

    #[test]
    fn encode_round_trips_and_marks_roots_as_null() {
        assert_eq!(Ancestry::root().encode(), None);
        assert_eq!(Ancestry::from_ids(vec![2, 3]).encode().as_deref(), Some("2/3"));
        let decoded = Ancestry::decode(Ancestry::from_ids(vec![5, 9]).encode().as_deref());
        assert_eq!(decoded.ids(), &[5, 9]);
    }

    #[test]
    fn child_appends_parent_id() {
        let root = Ancestry::root();
        let first = root.child(2);
        assert_eq!(first.ids(), &[2]);
        assert_eq!(first.child(3).ids(), &[2, 3]);
    }

    #[test]
    fn child_path_contains_every_ancestor() {
        let path = Ancestry::root().child(2).child(3);
        assert!(path.has_ancestor(2));
        assert!(path.has_ancestor(3));
        assert!(!path.has_ancestor(4));
        assert_eq!(path.parent_id(), Some(3));
        assert_eq!(path.depth(), 2);
        assert_eq!(Ancestry::root().depth(), 0);
    }

    #[test]
    fn rebase_splices_new_prefix_onto_moved_subtree() {
        // note 4 sits at 2/3; moving note 3 to the top level leaves 4 at 3.
        let deep = Ancestry::from_ids(vec![2, 3]);
        assert_eq!(deep.rebase(3, &Ancestry::root()).ids(), &[3]);
        // moving note 3 under note 8 leaves 4 at 8/3.
        assert_eq!(
            deep.rebase(3, &Ancestry::from_ids(vec![8])).ids(),
            &[8, 3]
        );
        // unrelated paths are untouched.
        assert_eq!(deep.rebase(9, &Ancestry::root()).ids(), &[2, 3]);
    }
}
