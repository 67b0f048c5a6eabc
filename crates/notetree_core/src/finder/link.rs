//! Inline link and duplicate matching against a target note's content.
//!
//! # Responsibility
//! - Recognize `[[content]]` and `##content` references to one target.
//! - Recognize whole-content duplicates of the target.
//!
//! # Invariants
//! - Matching is case-insensitive on both sides.
//! - The bracketed/hashed text must equal the target content exactly; this
//!   is content equality, not fuzzy search.
//! - A blank target matches nothing.

/// Prepared needles for one target note's content.
///
/// Built once per lookup so the target content is lowercased a single time
/// regardless of how many candidates are scanned.
#[derive(Debug, Clone)]
pub struct LinkMatcher {
    bracket_needle: String,
    hash_needle: String,
    duplicate_needle: String,
}

impl LinkMatcher {
    pub fn new(target_content: &str) -> Self {
        let lowered = target_content.to_lowercase();
        Self {
            bracket_needle: format!("[[{lowered}]]"),
            hash_needle: format!("##{lowered}"),
            duplicate_needle: lowered,
        }
    }

    /// Whether `content` references the target through either link syntax.
    pub fn links_to_target(&self, content: &str) -> bool {
        if self.duplicate_needle.is_empty() {
            return false;
        }
        let lowered = content.to_lowercase();
        lowered.contains(&self.bracket_needle) || lowered.contains(&self.hash_needle)
    }

    /// Whether `content` equals the target content, ignoring case.
    pub fn duplicates_target(&self, content: &str) -> bool {
        !self.duplicate_needle.is_empty() && content.to_lowercase() == self.duplicate_needle
    }
}

#[cfg(test)]
mod tests {
    use super::LinkMatcher;

    #[test]
    fn bracket_form_matches_anywhere_in_content() {
        let matcher = LinkMatcher::new("Note to be linked");
        assert!(matcher.links_to_target("see [[Note to be linked]] for details"));
        assert!(matcher.links_to_target("[[note TO BE linked]]"));
        assert!(!matcher.links_to_target("see Note to be linked without brackets"));
    }

    #[test]
    fn hash_form_matches_anywhere_in_content() {
        let matcher = LinkMatcher::new("Note to be linked");
        assert!(matcher.links_to_target("##Note to be linked"));
        assert!(matcher.links_to_target("tail mention ##NOTE TO BE LINKED"));
        assert!(!matcher.links_to_target("#Note to be linked"));
    }

    #[test]
    fn partial_bracket_content_does_not_match() {
        let matcher = LinkMatcher::new("Note to be linked");
        assert!(!matcher.links_to_target("[[Note to be]] linked"));
        assert!(!matcher.links_to_target("[[Note to be linked twice over]]"));
    }

    #[test]
    fn duplicate_requires_whole_content_equality() {
        let matcher = LinkMatcher::new("Climate Change");
        assert!(matcher.duplicates_target("climate change"));
        assert!(matcher.duplicates_target("CLIMATE CHANGE"));
        assert!(!matcher.duplicates_target("climate change research"));
    }

    #[test]
    fn blank_target_matches_nothing() {
        let matcher = LinkMatcher::new("");
        assert!(!matcher.links_to_target("[[]] ## anything"));
        assert!(!matcher.duplicates_target(""));
    }
}
