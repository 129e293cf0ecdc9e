//! Serde helpers for provider payloads.
//!
//! The provider API emits `null` for empty strings and empty lists in a number
//! of places. These helpers let the model keep plain `String`/`Vec` fields.

use serde::{Deserialize, Deserializer};

/// Deserialize a value, mapping JSON `null` to `T::default()`.
///
/// Combine with `#[serde(default)]` so that absent fields are covered too.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Predicate for `skip_serializing_if` on boolean flags.
pub fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "null_as_default")]
        name: String,
        #[serde(default, deserialize_with = "null_as_default")]
        tags: Vec<String>,
    }

    #[test]
    fn null_and_missing_become_defaults() {
        let s: Sample = serde_json::from_str(r#"{"name": null}"#).unwrap();
        assert_eq!(s.name, "");
        assert!(s.tags.is_empty());

        let s: Sample = serde_json::from_str(r#"{"name": "a", "tags": ["x"]}"#).unwrap();
        assert_eq!(s.name, "a");
        assert_eq!(s.tags, vec!["x".to_string()]);
    }
}
