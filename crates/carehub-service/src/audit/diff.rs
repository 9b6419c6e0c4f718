//! Field-level diffing of entity snapshots.

use serde_json::{Map, Value};

use carehub_entity::audit::{ChangeType, NewFieldChange};

/// A JSON record as produced by serializing an entity.
pub type JsonObject = Map<String, Value>;

/// Compute the field changes between two snapshots of one entity.
///
/// - `Create`: one entry per key of `new`, carrying only the new value.
/// - `Update`: one entry per key of `new` whose value differs from `old`
///   (a missing `old` is treated as empty). An absent old key is `None`,
///   which differs from an explicit `null`.
/// - `Delete`: one entry per key of `old`, carrying only the old value.
///
/// Entries follow the key order of the driving record.
pub fn compute_field_changes(
    old: Option<&JsonObject>,
    new: Option<&JsonObject>,
    change_type: ChangeType,
) -> Vec<NewFieldChange> {
    let entry = |field_name: &str, old_value: Option<&Value>, new_value: Option<&Value>| {
        NewFieldChange {
            field_name: field_name.to_string(),
            old_value: old_value.cloned(),
            new_value: new_value.cloned(),
            change_type,
        }
    };

    match change_type {
        ChangeType::Create => new
            .into_iter()
            .flatten()
            .map(|(key, value)| entry(key, None, Some(value)))
            .collect(),
        ChangeType::Update => new
            .into_iter()
            .flatten()
            .filter_map(|(key, value)| {
                let previous = old.and_then(|o| o.get(key));
                (previous != Some(value)).then(|| entry(key, previous, Some(value)))
            })
            .collect(),
        ChangeType::Delete => old
            .into_iter()
            .flatten()
            .map(|(key, value)| entry(key, Some(value), None))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn obj(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_update_emits_only_differing_keys_in_order() {
        let old = obj(json!({"a": 1, "b": 2}));
        let new = obj(json!({"a": 1, "b": 3, "c": 4}));

        let changes = compute_field_changes(Some(&old), Some(&new), ChangeType::Update);

        assert_eq!(
            changes,
            vec![
                NewFieldChange {
                    field_name: "b".into(),
                    old_value: Some(json!(2)),
                    new_value: Some(json!(3)),
                    change_type: ChangeType::Update,
                },
                NewFieldChange {
                    field_name: "c".into(),
                    old_value: None,
                    new_value: Some(json!(4)),
                    change_type: ChangeType::Update,
                },
            ]
        );
    }

    #[test]
    fn test_update_compares_nested_values_deeply() {
        let old = obj(json!({"tags": ["x", "y"], "address": {"city": "Oslo"}}));
        let same = obj(json!({"tags": ["x", "y"], "address": {"city": "Oslo"}}));
        let moved = obj(json!({"tags": ["x", "y"], "address": {"city": "Bergen"}}));

        assert!(compute_field_changes(Some(&old), Some(&same), ChangeType::Update).is_empty());

        let changes = compute_field_changes(Some(&old), Some(&moved), ChangeType::Update);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field_name, "address");
    }

    #[test]
    fn test_update_distinguishes_absent_from_null() {
        let old = obj(json!({}));
        let new = obj(json!({"industry": null}));

        let changes = compute_field_changes(Some(&old), Some(&new), ChangeType::Update);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_value, None);
        assert_eq!(changes[0].new_value, Some(Value::Null));

        let old = obj(json!({"industry": null}));
        assert!(compute_field_changes(Some(&old), Some(&new), ChangeType::Update).is_empty());
    }

    #[test]
    fn test_update_without_old_treats_every_key_as_new() {
        let new = obj(json!({"a": 1, "b": null}));
        let changes = compute_field_changes(None, Some(&new), ChangeType::Update);
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.old_value.is_none()));
    }

    #[test]
    fn test_create_emits_new_only_entry_per_key() {
        let new = obj(json!({"name": "Acme", "is_active": true, "industry": null}));
        let changes = compute_field_changes(None, Some(&new), ChangeType::Create);

        let names: Vec<_> = changes.iter().map(|c| c.field_name.as_str()).collect();
        assert_eq!(names, ["name", "is_active", "industry"]);
        assert!(changes.iter().all(|c| c.old_value.is_none() && c.new_value.is_some()));
        assert!(changes.iter().all(|c| c.change_type == ChangeType::Create));
    }

    #[test]
    fn test_delete_emits_old_only_entry_per_key() {
        let old = obj(json!({"name": "Acme", "is_active": false}));
        let changes = compute_field_changes(Some(&old), None, ChangeType::Delete);

        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.new_value.is_none() && c.old_value.is_some()));
        assert!(changes.iter().all(|c| c.change_type == ChangeType::Delete));
    }

    #[test]
    fn test_missing_driving_record_yields_nothing() {
        let old = obj(json!({"a": 1}));
        assert!(compute_field_changes(Some(&old), None, ChangeType::Create).is_empty());
        assert!(compute_field_changes(Some(&old), None, ChangeType::Update).is_empty());
        assert!(compute_field_changes(None, Some(&old), ChangeType::Delete).is_empty());
    }
}
