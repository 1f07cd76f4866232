//! Document filters evaluated in application memory.
//!
//! # Invariants
//! - Id comparisons go through normalized ids.
//! - Prefix matching is case-insensitive and literal (no pattern syntax).
//! - An empty prefix matches every document, even ones missing the field.

use super::{document_id, Document};
use crate::model::id::{normalize_id, RecordId};
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    IdEq(RecordId),
    /// Normalized ids; build with [`Filter::ids`].
    IdIn(HashSet<String>),
    /// Exact JSON equality on a top-level field.
    FieldEq {
        field: String,
        value: Value,
    },
    /// A top-level id-valued field (or an element of an id array) equals `id`.
    RefEq {
        field: String,
        id: RecordId,
    },
    /// Case-insensitive prefix on a string field, or any element of a string array.
    FieldPrefix {
        field: String,
        prefix: String,
    },
    And(Vec<Filter>),
}

impl Filter {
    pub fn id(id: &RecordId) -> Self {
        Self::IdEq(id.clone())
    }

    /// Matches any of `ids`. The normalized set is built once per filter.
    pub fn ids<'a>(ids: impl IntoIterator<Item = &'a RecordId>) -> Self {
        Self::IdIn(ids.into_iter().map(RecordId::normalized).collect())
    }

    pub fn field_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::FieldEq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn reference(field: impl Into<String>, id: &RecordId) -> Self {
        Self::RefEq {
            field: field.into(),
            id: id.clone(),
        }
    }

    pub fn prefix(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::FieldPrefix {
            field: field.into(),
            prefix: prefix.into(),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::All => true,
            Self::IdEq(id) => document_id(doc).is_some_and(|doc_id| doc_id == *id),
            Self::IdIn(wanted) => {
                document_id(doc).is_some_and(|doc_id| wanted.contains(&doc_id.normalized()))
            }
            Self::FieldEq { field, value } => doc.get(field) == Some(value),
            Self::RefEq { field, id } => {
                let wanted = id.normalized();
                match doc.get(field) {
                    Some(Value::String(raw)) => normalize_id(raw) == wanted,
                    Some(Value::Array(items)) => items
                        .iter()
                        .filter_map(Value::as_str)
                        .any(|raw| normalize_id(raw) == wanted),
                    _ => false,
                }
            }
            Self::FieldPrefix { field, prefix } => {
                if prefix.is_empty() {
                    return true;
                }
                let prefix = prefix.to_lowercase();
                match doc.get(field) {
                    Some(Value::String(text)) => text.to_lowercase().starts_with(&prefix),
                    Some(Value::Array(items)) => items
                        .iter()
                        .filter_map(Value::as_str)
                        .any(|text| text.to_lowercase().starts_with(&prefix)),
                    _ => false,
                }
            }
            Self::And(filters) => filters.iter().all(|filter| filter.matches(doc)),
        }
    }

    /// Returns the id when this filter selects exactly one id, so backends can
    /// use a keyed lookup instead of a scan.
    pub(crate) fn as_single_id(&self) -> Option<&RecordId> {
        match self {
            Self::IdEq(id) => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Filter;
    use crate::model::id::RecordId;
    use crate::store::Document;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn prefix_is_case_insensitive_and_anchored() {
        let filter = Filter::prefix("title", "andrew");
        assert!(filter.matches(&doc(json!({"title": "Andrew's First Album"}))));
        assert!(filter.matches(&doc(json!({"title": "andrew's Second Album"}))));
        assert!(!filter.matches(&doc(json!({"title": "The First Inc. andrew"}))));
    }

    #[test]
    fn prefix_matches_any_array_element() {
        let filter = Filter::prefix("artists", "da");
        assert!(filter.matches(&doc(json!({"artists": ["Ann", "Daft Punk"]}))));
        assert!(!filter.matches(&doc(json!({"artists": ["Ann"]}))));
    }

    #[test]
    fn prefix_is_literal_text() {
        let filter = Filter::prefix("title", "a.c");
        assert!(!filter.matches(&doc(json!({"title": "abc"}))));
        assert!(filter.matches(&doc(json!({"title": "A.C. Live"}))));
    }

    #[test]
    fn empty_prefix_matches_everything() {
        let filter = Filter::prefix("title", "");
        assert!(filter.matches(&doc(json!({}))));
    }

    #[test]
    fn reference_equality_is_representation_tolerant() {
        let filter = Filter::reference("album_id", &RecordId::new("ABCD-1234"));
        assert!(filter.matches(&doc(json!({"album_id": "abcd1234"}))));
        assert!(!filter.matches(&doc(json!({"album_id": "abcd12345"}))));
    }

    #[test]
    fn id_set_matches_any_spelling() {
        let wanted = [RecordId::new("ABCD-0001"), RecordId::new("ffff")];
        let filter = Filter::ids(&wanted);
        assert!(filter.matches(&doc(json!({"_id": "abcd0001"}))));
        assert!(filter.matches(&doc(json!({"_id": "FF-FF"}))));
        assert!(!filter.matches(&doc(json!({"_id": "abcd0002"}))));
        let none: [RecordId; 0] = [];
        assert!(!Filter::ids(&none).matches(&doc(json!({"_id": "ffff"}))));
    }

    #[test]
    fn and_requires_every_branch() {
        let filter = Filter::And(vec![
            Filter::prefix("title", "blue"),
            Filter::prefix("artists", "miles"),
        ]);
        assert!(filter.matches(&doc(json!({"title": "Blue in Green", "artists": ["Miles Davis"]}))));
        assert!(!filter.matches(&doc(json!({"title": "Blue in Green", "artists": ["Bill Evans"]}))));
    }
}
