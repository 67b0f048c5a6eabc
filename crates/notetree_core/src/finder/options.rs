//! Query option structures and their loose-input parsing boundary.
//!
//! # Responsibility
//! - Define the explicit, fully-typed options the finders consume.
//! - Absorb the permissive wire forms callers send (truthy strings, scalar
//!   ids, explicit nulls) in one place.
//!
//! # Invariants
//! - Core code only ever sees explicit booleans and id lists; coercion stops
//!   at this module.
//! - Malformed optional values coerce to "no filter" or `false`, never to an
//!   error.

use crate::model::note::{NoteId, UserId};
use crate::repo::note_store::AncestryScope;
use serde::de::{Deserializer, IgnoredAny};
use serde::Deserialize;

/// Criteria and expansion flags for a general note lookup.
///
/// All criteria are optional and ANDed. When deserialized from a request,
/// boolean flags also accept the string `"true"` (anything else is `false`)
/// and id/slug filters accept a bare scalar as a one-element set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NoteQuery {
    #[serde(deserialize_with = "one_or_many")]
    pub ids: Option<Vec<NoteId>>,
    #[serde(deserialize_with = "one_or_many")]
    pub user_ids: Option<Vec<UserId>>,
    #[serde(deserialize_with = "one_or_many")]
    pub slugs: Option<Vec<String>>,
    /// Explicit `null` in a request selects roots only; an absent field
    /// applies no ancestry filter.
    #[serde(deserialize_with = "ancestry_scope")]
    pub ancestry: AncestryScope,
    /// Case-sensitive SQL LIKE pattern; wildcards are honored as written.
    #[serde(deserialize_with = "optional_text")]
    pub content_like: Option<String>,
    #[serde(deserialize_with = "truthy_flag")]
    pub include_user: bool,
    #[serde(deserialize_with = "truthy_flag")]
    pub include_descendants: bool,
    #[serde(deserialize_with = "truthy_flag")]
    pub include_ancestors: bool,
}

/// Options for a related-note lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RelatedQuery {
    /// Identity resolved by the calling context; never authenticated here.
    pub authenticated_user_id: Option<UserId>,
    #[serde(deserialize_with = "truthy_flag")]
    pub include_user: bool,
    #[serde(deserialize_with = "truthy_flag")]
    pub include_descendants: bool,
    #[serde(deserialize_with = "truthy_flag")]
    pub include_ancestors: bool,
}

fn truthy_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Flag(bool),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Flag(value)) => value,
        Some(Raw::Text(value)) => value == "true",
        Some(Raw::Other(_)) | None => false,
    })
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        One(T),
        Many(Vec<T>),
        Other(IgnoredAny),
    }

    Ok(match Option::<Raw<T>>::deserialize(deserializer)? {
        Some(Raw::One(value)) => Some(vec![value]),
        Some(Raw::Many(values)) => Some(values),
        Some(Raw::Other(_)) | None => None,
    })
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(value)) => Some(value),
        Some(Raw::Other(_)) | None => None,
    })
}

fn ancestry_scope<'de, D>(deserializer: D) -> Result<AncestryScope, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => AncestryScope::RootsOnly,
        Some(Raw::Text(value)) => match value.as_str() {
            "roots_only" => AncestryScope::RootsOnly,
            "non_roots_only" => AncestryScope::NonRootsOnly,
            _ => AncestryScope::Any,
        },
        Some(Raw::Other(_)) => AncestryScope::Any,
    })
}

#[cfg(test)]
mod tests {
    use super::{NoteQuery, RelatedQuery};
    use crate::repo::note_store::AncestryScope;
    use serde_json::json;

    #[test]
    fn absent_fields_fall_back_to_defaults() {
        let query: NoteQuery = serde_json::from_value(json!({})).unwrap();
        assert_eq!(query, NoteQuery::default());
        assert_eq!(query.ancestry, AncestryScope::Any);
        assert!(!query.include_user);
    }

    #[test]
    fn flags_accept_bool_and_true_string_only() {
        let query: NoteQuery = serde_json::from_value(json!({
            "include_user": true,
            "include_descendants": "true",
            "include_ancestors": "yes",
        }))
        .unwrap();
        assert!(query.include_user);
        assert!(query.include_descendants);
        assert!(!query.include_ancestors);

        let query: NoteQuery =
            serde_json::from_value(json!({ "include_user": 1, "include_descendants": null }))
                .unwrap();
        assert!(!query.include_user);
        assert!(!query.include_descendants);
    }

    #[test]
    fn id_filters_accept_scalar_and_array_forms() {
        let query: NoteQuery =
            serde_json::from_value(json!({ "ids": 7, "user_ids": [1, 2] })).unwrap();
        assert_eq!(query.ids, Some(vec![7]));
        assert_eq!(query.user_ids, Some(vec![1, 2]));

        let query: NoteQuery = serde_json::from_value(json!({ "ids": null })).unwrap();
        assert_eq!(query.ids, None);

        let query: NoteQuery = serde_json::from_value(json!({ "ids": "garbage" })).unwrap();
        assert_eq!(query.ids, None);
    }

    #[test]
    fn slug_filter_accepts_scalar_form() {
        let query: NoteQuery = serde_json::from_value(json!({ "slugs": "climate_change" })).unwrap();
        assert_eq!(query.slugs, Some(vec!["climate_change".to_string()]));
    }

    #[test]
    fn malformed_content_pattern_applies_no_filter() {
        let query: NoteQuery = serde_json::from_value(json!({ "content_like": "%rust%" })).unwrap();
        assert_eq!(query.content_like.as_deref(), Some("%rust%"));

        let query: NoteQuery = serde_json::from_value(json!({ "content_like": 5 })).unwrap();
        assert_eq!(query.content_like, None);
    }

    #[test]
    fn explicit_null_ancestry_selects_roots_only() {
        let query: NoteQuery = serde_json::from_value(json!({ "ancestry": null })).unwrap();
        assert_eq!(query.ancestry, AncestryScope::RootsOnly);

        let query: NoteQuery =
            serde_json::from_value(json!({ "ancestry": "non_roots_only" })).unwrap();
        assert_eq!(query.ancestry, AncestryScope::NonRootsOnly);

        let query: NoteQuery = serde_json::from_value(json!({ "ancestry": true })).unwrap();
        assert_eq!(query.ancestry, AncestryScope::Any);
    }

    #[test]
    fn related_query_parses_identity_and_flags() {
        let query: RelatedQuery = serde_json::from_value(json!({
            "authenticated_user_id": 42,
            "include_user": "true",
        }))
        .unwrap();
        assert_eq!(query.authenticated_user_id, Some(42));
        assert!(query.include_user);
        assert!(!query.include_descendants);
    }
}
