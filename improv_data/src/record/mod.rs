//! Records - the nested key/value structure every data source is expressed in.
//!
//! A record is a JSON object: values are scalars, sequences or nested records.
//! Merging follows a single conflict rule:
//! - Record ⊕ Record recurses key by key
//! - Anything else is replaced wholesale by the right-hand side

mod path;

pub use path::*;

pub use serde_json::Value;

/// A mapping from string keys to values.
pub type Record = serde_json::Map<String, Value>;

/// Recursive deep merge of two values, `source` overriding `target`.
///
/// Sequences and `null` are not special: they replace whatever was there.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            merge_records(&mut target_map, source_map);
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Deep merge `source` into `target` in place.
pub fn merge_records(target: &mut Record, source: Record) {
    for (key, source_val) in source {
        let merged = match target.remove(&key) {
            Some(target_val) => deep_merge(target_val, source_val),
            None => source_val,
        };
        target.insert(key, merged);
    }
}

/// Convert a value into a record, if it is one.
pub fn into_record(value: Value) -> Option<Record> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        into_record(value).unwrap()
    }

    #[test]
    fn test_merge_simple_override() {
        let merged = deep_merge(json!({"a": 1, "b": 2}), json!({"a": 10}));
        assert_eq!(merged, json!({"a": 10, "b": 2}));
    }

    #[test]
    fn test_merge_nested_records_recurse() {
        let merged = deep_merge(
            json!({"site": {"name": "Hub", "owner": "Hubot"}}),
            json!({"site": {"name": "The Hub", "lang": "en"}}),
        );
        assert_eq!(
            merged,
            json!({"site": {"name": "The Hub", "owner": "Hubot", "lang": "en"}})
        );
    }

    #[test]
    fn test_merge_sequences_replaced_wholesale() {
        let merged = deep_merge(json!({"tags": [1, 2, 3]}), json!({"tags": [9]}));
        assert_eq!(merged, json!({"tags": [9]}));
    }

    #[test]
    fn test_merge_scalar_over_record_and_back() {
        let merged = deep_merge(json!({"site": {"name": "Hub"}}), json!({"site": "Hub"}));
        assert_eq!(merged, json!({"site": "Hub"}));

        let merged = deep_merge(json!({"site": "Hub"}), json!({"site": {"name": "Hub"}}));
        assert_eq!(merged, json!({"site": {"name": "Hub"}}));
    }

    #[test]
    fn test_merge_null_overrides() {
        let merged = deep_merge(json!({"a": 1}), json!({"a": null}));
        assert_eq!(merged, json!({"a": null}));
    }

    #[test]
    fn test_merge_records_in_place() {
        let mut target = record(json!({"user": {"name": "frendo"}}));
        merge_records(&mut target, record(json!({"user": {"type": "human"}})));
        assert_eq!(
            Value::Object(target),
            json!({"user": {"name": "frendo", "type": "human"}})
        );
    }

    #[test]
    fn test_into_record_rejects_scalars() {
        assert!(into_record(json!("text")).is_none());
        assert!(into_record(json!([1])).is_none());
        assert!(into_record(json!({})).is_some());
    }
}
