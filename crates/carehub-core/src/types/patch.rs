//! Serde support for partial updates of nullable columns.
//!
//! A patch field of type `Option<Option<T>>` distinguishes three requests:
//! key absent (`None`, leave the column alone), explicit `null`
//! (`Some(None)`, clear it) and a value (`Some(Some(v))`, set it).

use serde::{Deserialize, Deserializer};

/// Deserializer for `Option<Option<T>>` patch fields.
///
/// Pair it with `#[serde(default)]` so an absent key stays `None`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
        title: Option<Option<String>>,
    }

    #[test]
    fn test_absent_null_and_value_are_distinct() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let cleared: Patch = serde_json::from_str(r#"{"title": null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"title": "Lead"}"#).unwrap();

        assert_eq!(absent.title, None);
        assert_eq!(cleared.title, Some(None));
        assert_eq!(set.title, Some(Some("Lead".to_string())));
    }

    #[test]
    fn test_clear_serializes_as_null() {
        let cleared = Patch { title: Some(None) };
        assert_eq!(serde_json::to_string(&cleared).unwrap(), r#"{"title":null}"#);
        assert_eq!(serde_json::to_string(&Patch::default()).unwrap(), "{}");
    }
}
