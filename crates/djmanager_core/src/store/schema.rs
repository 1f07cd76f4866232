//! Per-collection stored field validation.
//!
//! This is the store's own check on written documents (required fields and
//! JSON types), independent of the core's input validation. Unknown fields
//! are allowed.

use super::{Collection, Document, StoreError, StoreResult};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    /// Non-empty string when required.
    Text,
    TextArray,
    Bool,
}

#[derive(Debug, Clone, Copy)]
struct FieldRule {
    name: &'static str,
    kind: FieldKind,
    required: bool,
}

const fn rule(name: &'static str, kind: FieldKind, required: bool) -> FieldRule {
    FieldRule {
        name,
        kind,
        required,
    }
}

const ALBUM_RULES: &[FieldRule] = &[
    rule("title", FieldKind::Text, true),
    rule("record_label", FieldKind::Text, true),
    rule("label_number", FieldKind::Text, true),
    rule("artists", FieldKind::TextArray, true),
    rule("tags", FieldKind::TextArray, false),
];

const SONG_RULES: &[FieldRule] = &[
    rule("title", FieldKind::Text, true),
    rule("artists", FieldKind::TextArray, true),
    rule("album_id", FieldKind::Text, true),
];

const SET_RULES: &[FieldRule] = &[
    rule("title", FieldKind::Text, true),
    rule("creator", FieldKind::Text, true),
    rule("is_published", FieldKind::Bool, true),
    rule("tags", FieldKind::TextArray, false),
    rule("songs", FieldKind::TextArray, true),
];

fn rules_for(collection: Collection) -> &'static [FieldRule] {
    match collection {
        Collection::Albums => ALBUM_RULES,
        Collection::Songs => SONG_RULES,
        Collection::Sets => SET_RULES,
    }
}

/// Validates a document about to be written to `collection`.
///
/// Reports the first violated field.
pub fn validate_document(collection: Collection, doc: &Document) -> StoreResult<()> {
    for field_rule in rules_for(collection) {
        let violation = |message: &str| StoreError::SchemaViolation {
            collection,
            field: field_rule.name.to_string(),
            message: message.to_string(),
        };

        match (doc.get(field_rule.name), field_rule.kind) {
            (None | Some(Value::Null), _) => {
                if field_rule.required {
                    return Err(violation("is required"));
                }
            }
            (Some(Value::String(text)), FieldKind::Text) => {
                if field_rule.required && text.is_empty() {
                    return Err(violation("is required"));
                }
            }
            (Some(Value::Array(items)), FieldKind::TextArray) => {
                if !items.iter().all(Value::is_string) {
                    return Err(violation("must contain only strings"));
                }
            }
            (Some(Value::Bool(_)), FieldKind::Bool) => {}
            (Some(_), FieldKind::Text) => return Err(violation("must be a string")),
            (Some(_), FieldKind::TextArray) => return Err(violation("must be an array")),
            (Some(_), FieldKind::Bool) => return Err(violation("must be a boolean")),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_document;
    use crate::store::{Collection, StoreError};
    use serde_json::json;

    #[test]
    fn accepts_complete_song() {
        let doc = json!({"title": "Intro", "artists": ["A"], "album_id": "x"});
        validate_document(Collection::Songs, doc.as_object().unwrap()).unwrap();
    }

    #[test]
    fn rejects_empty_required_string() {
        let doc = json!({"title": "", "artists": ["A"], "album_id": "x"});
        let err = validate_document(Collection::Songs, doc.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, StoreError::SchemaViolation { ref field, .. } if field == "title"));
    }

    #[test]
    fn rejects_wrong_publish_flag_type() {
        let doc = json!({
            "title": "Warmup",
            "creator": "dj",
            "is_published": "yes",
            "songs": []
        });
        let err = validate_document(Collection::Sets, doc.as_object().unwrap()).unwrap_err();
        assert!(
            matches!(err, StoreError::SchemaViolation { ref field, .. } if field == "is_published")
        );
    }

    #[test]
    fn optional_tags_may_be_absent() {
        let doc = json!({
            "title": "Album",
            "record_label": "Label",
            "label_number": "LBL-1",
            "artists": ["A"]
        });
        validate_document(Collection::Albums, doc.as_object().unwrap()).unwrap();
    }
}
