//! Decode-or-default for untrusted JSON (remote payloads, mirror contents)

use crate::error::{Result, SyncError};
use crate::types::Entity;
use serde_json::Value;
use tracing::warn;

/// Decode, normalize and validate a single entity
pub fn decode_entity<E: Entity>(value: Value) -> Result<E> {
    let mut entity: E = serde_json::from_value(value)
        .map_err(|e| SyncError::decode(format!("invalid {}: {}", E::KIND, e)))?;
    entity.normalize();
    entity.validate().map_err(|e| SyncError::decode(e.to_string()))?;
    Ok(entity)
}

/// Decode a JSON array, failing on the first bad element
pub fn decode_list<E: Entity>(value: Value) -> Result<Vec<E>> {
    match value {
        Value::Array(items) => items.into_iter().map(decode_entity).collect(),
        other => Err(SyncError::decode(format!(
            "expected a list of {}s, got {}",
            E::KIND,
            json_type(&other)
        ))),
    }
}

/// Decode a JSON array, dropping bad elements with a warning.
///
/// Returns `None` when the value is not an array at all.
pub fn decode_list_lenient<E: Entity>(value: Value) -> Option<Vec<E>> {
    let Value::Array(items) = value else {
        warn!(kind = %E::KIND, found = json_type(&value), "expected a list");
        return None;
    };

    let decoded = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match decode_entity::<E>(item) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!(kind = %E::KIND, index, error = %e, "dropping malformed entry");
                None
            }
        })
        .collect();
    Some(decoded)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, Task};
    use serde_json::json;

    #[test]
    fn test_decode_normalizes() {
        let task: Task =
            decode_entity(json!({"id": 4, "title": "  Fix  ", "columnId": 2})).unwrap();
        assert_eq!(task.id, "4");
        assert_eq!(task.title, "Fix");
    }

    #[test]
    fn test_blank_title_is_decode_error() {
        let err = decode_entity::<Column>(json!({"id": 1, "title": " ", "boardId": 1}))
            .unwrap_err();
        assert!(matches!(err, SyncError::Decode { .. }));
    }

    #[test]
    fn test_strict_list_fails_on_bad_element() {
        let value = json!([
            {"id": 1, "title": "A", "boardId": 1},
            {"id": 2, "boardId": 1}
        ]);
        assert!(decode_list::<Column>(value).is_err());
        assert!(decode_list::<Column>(json!({"id": 1})).is_err());
    }

    #[test]
    fn test_lenient_list_drops_bad_elements() {
        let value = json!([
            {"id": 1, "title": "A", "boardId": 1},
            "garbage",
            {"id": 3, "title": "C", "boardId": 1, "position": 1}
        ]);
        let columns = decode_list_lenient::<Column>(value).unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[1].id, "3");
        assert!(decode_list_lenient::<Column>(json!("nope")).is_none());
    }
}
