//! Structural skeletons of metadata documents.
//!
//! A skeleton keeps the shape of a document and throws its data away. Two
//! documents that describe the same logical structure with different values
//! have equal skeletons.
//!
//! Rules, applied per record:
//! - scalars become their type name: `"null"`, `"bool"`, `"int"`, `"float"`, `"str"`;
//! - objects keep their keys, with skeletonized values;
//! - lists collapse to the sorted set of distinct element skeletons, so
//!   length is data, not structure;
//! - a string under the `type` key is kept verbatim;
//! - at record top level, [`VOLATILE_KEYS`] and [`ANNOTATION_KEYS`] are
//!   dropped entirely.

use cairn_types::Document;
use serde_json::{Map, Value};

/// Keys whose values change on every save or identify an instance.
pub const VOLATILE_KEYS: &[&str] = &["saved_at", "path", "updated_at", "created_at", "slug", "name"];

/// Free-form annotations attached by users, never part of structure.
pub const ANNOTATION_KEYS: &[&str] = &["description", "tags", "comments", "links"];

/// Skeleton of a whole document, one entry per record in lineage order.
pub fn skeleton(document: &Document) -> Value {
    Value::Array(
        document
            .records()
            .iter()
            .map(|record| skeleton_object(record, true))
            .collect(),
    )
}

fn skeleton_object(record: &Map<String, Value>, top_level: bool) -> Value {
    let mut out = Map::new();
    for (key, value) in record {
        if top_level
            && (VOLATILE_KEYS.contains(&key.as_str()) || ANNOTATION_KEYS.contains(&key.as_str()))
        {
            continue;
        }
        let shape = match (key.as_str(), value) {
            ("type", Value::String(_)) => value.clone(),
            _ => skeleton_value(value),
        };
        out.insert(key.clone(), shape);
    }
    Value::Object(out)
}

fn skeleton_value(value: &Value) -> Value {
    match value {
        Value::Null => Value::from("null"),
        Value::Bool(_) => Value::from("bool"),
        Value::Number(n) if n.is_f64() => Value::from("float"),
        Value::Number(_) => Value::from("int"),
        Value::String(_) => Value::from("str"),
        Value::Array(items) => {
            let mut shapes: Vec<Value> = items.iter().map(skeleton_value).collect();
            shapes.sort_by_key(|v| v.to_string());
            shapes.dedup();
            Value::Array(shapes)
        }
        Value::Object(map) => skeleton_object(map, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[test]
    fn scalars_become_type_names() {
        let s = skeleton(&doc(json!({"a": 1, "b": 1.5, "c": "x", "d": true, "e": null})));
        assert_eq!(
            s,
            json!([{"a": "int", "b": "float", "c": "str", "d": "bool", "e": "null"}])
        );
    }

    #[test]
    fn type_key_is_literal() {
        let s = skeleton(&doc(json!({"type": "dataset"})));
        assert_eq!(s, json!([{"type": "dataset"}]));
    }

    #[test]
    fn volatile_and_annotation_keys_are_dropped() {
        let s = skeleton(&doc(json!({
            "name": "swift-amber-heron",
            "saved_at": "2024-01-01T00:00:00Z",
            "tags": ["x"],
            "description": "about",
            "size": 3
        })));
        assert_eq!(s, json!([{"size": "int"}]));
    }

    #[test]
    fn list_length_is_not_structure() {
        let a = skeleton(&doc(json!({"items": [1, 2, 3]})));
        let b = skeleton(&doc(json!({"items": [7]})));
        assert_eq!(a, b);
        assert_eq!(a, json!([{"items": ["int"]}]));
    }

    #[test]
    fn nested_objects_keep_keys() {
        let s = skeleton(&doc(json!({"params": {"lr": 0.1, "name": "adam"}})));
        // Volatile keys are only dropped at record top level.
        assert_eq!(s, json!([{"params": {"lr": "float", "name": "str"}}]));
    }

    #[test]
    fn lineage_records_are_kept_in_order() {
        let s = skeleton(&doc(json!([{"type": "modifier"}, {"type": "dataset"}])));
        assert_eq!(s, json!([{"type": "modifier"}, {"type": "dataset"}]));
    }
}
