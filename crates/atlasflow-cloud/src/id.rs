//! Composite resource identifiers
//!
//! A resource's durable handle packs several key components (project id,
//! cluster name, remote id) into one opaque string:
//!
//! ```text
//! cluster_name:Q2x1c3RlcjA=-project_id:NWYxYw==-snapshot_id:NjBhYg==
//! ```
//!
//! Keys are sorted, values are standard base64, and components are joined
//! with `-`. Neither `-` nor `:` appears in the base64 alphabet, so values
//! containing either character still decode unambiguously.
//!
//! Import identifiers are different: they are typed by humans in the form
//! `{project_id}-{resource_id}` and are parsed with [`split_import_id`].

use crate::error::{CloudError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::BTreeMap;

const COMPONENT_SEPARATOR: char = '-';
const KEY_SEPARATOR: char = ':';

/// Decoded composite identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateId {
    components: BTreeMap<String, String>,
}

impl StateId {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.components.insert(key.into(), value.into());
        self
    }

    /// Render the identifier as `key:base64(value)` components joined by `-`
    pub fn encode(&self) -> String {
        self.components
            .iter()
            .map(|(key, value)| format!("{}{}{}", key, KEY_SEPARATOR, STANDARD.encode(value)))
            .collect::<Vec<_>>()
            .join(&COMPONENT_SEPARATOR.to_string())
    }

    /// Parse an encoded identifier that must contain exactly `expected_keys`
    pub fn decode(id: &str, expected_keys: &[&str]) -> Result<Self> {
        let expected = expected_format(expected_keys);
        let format_error = || CloudError::identifier_format(id, expected.clone());

        let parts: Vec<&str> = if id.is_empty() {
            Vec::new()
        } else {
            id.split(COMPONENT_SEPARATOR).collect()
        };
        if parts.len() != expected_keys.len() {
            return Err(format_error());
        }

        let mut components = BTreeMap::new();
        for part in parts {
            let (key, encoded) = part.split_once(KEY_SEPARATOR).ok_or_else(format_error)?;
            let bytes = STANDARD.decode(encoded).map_err(|_| format_error())?;
            let value = String::from_utf8(bytes).map_err(|_| format_error())?;
            components.insert(key.to_string(), value);
        }

        if expected_keys.iter().any(|k| !components.contains_key(*k)) {
            return Err(format_error());
        }

        Ok(Self { components })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.components.get(key).map(String::as_str)
    }

    /// Component lookup for keys that must be present
    pub fn component(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| {
            CloudError::identifier_format(self.encode(), expected_format(&[key]))
        })
    }
}

fn expected_format(keys: &[&str]) -> String {
    keys.iter()
        .map(|k| format!("{}:<base64>", k))
        .collect::<Vec<_>>()
        .join("-")
}

/// Encode `(key, value)` pairs into a composite identifier
pub fn encode_state_id(components: &[(&str, &str)]) -> String {
    components
        .iter()
        .fold(StateId::new(), |id, (k, v)| id.with(*k, *v))
        .encode()
}

/// Decode a composite identifier, requiring exactly the given keys
pub fn decode_state_id(id: &str, expected_keys: &[&str]) -> Result<StateId> {
    StateId::decode(id, expected_keys)
}

/// Split a human-typed import identifier into exactly `parts` segments
///
/// The split happens on the first `parts - 1` hyphens, so the final segment
/// may itself contain hyphens. Missing or empty segments are rejected with
/// the expected `format` in the error.
pub fn split_import_id<'a>(id: &'a str, parts: usize, format: &str) -> Result<Vec<&'a str>> {
    let segments: Vec<&str> = id.splitn(parts, COMPONENT_SEPARATOR).collect();
    if segments.len() != parts || segments.iter().any(|s| s.is_empty()) {
        return Err(CloudError::identifier_format(id, format));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_sorted_and_deterministic() {
        let a = encode_state_id(&[("project_id", "p1"), ("id", "a1")]);
        let b = encode_state_id(&[("id", "a1"), ("project_id", "p1")]);
        assert_eq!(a, b);
        assert!(a.starts_with("id:"));
    }

    #[test]
    fn test_round_trip() {
        let id = encode_state_id(&[
            ("project_id", "5f1c7a0b9d3e4f0012345678"),
            ("cluster_name", "Cluster0"),
            ("snapshot_id", "60ab0c1d2e3f4a5b6c7d8e9f"),
        ]);
        let decoded = decode_state_id(&id, &["project_id", "cluster_name", "snapshot_id"]).unwrap();
        assert_eq!(decoded.get("project_id"), Some("5f1c7a0b9d3e4f0012345678"));
        assert_eq!(decoded.get("cluster_name"), Some("Cluster0"));
        assert_eq!(decoded.get("snapshot_id"), Some("60ab0c1d2e3f4a5b6c7d8e9f"));
    }

    #[test]
    fn test_round_trip_with_separator_characters_in_values() {
        let id = encode_state_id(&[("cluster_name", "prod-east:1"), ("project_id", "p-1")]);
        let decoded = decode_state_id(&id, &["cluster_name", "project_id"]).unwrap();
        assert_eq!(decoded.component("cluster_name").unwrap(), "prod-east:1");
        assert_eq!(decoded.component("project_id").unwrap(), "p-1");
    }

    #[test]
    fn test_round_trip_many_values() {
        let long = "x".repeat(300);
        let samples = ["", "a", "Cluster0", "ünïcode", "with space", long.as_str()];
        for value in samples {
            let id = encode_state_id(&[("id", value), ("project_id", "p")]);
            let decoded = decode_state_id(&id, &["id", "project_id"]).unwrap();
            assert_eq!(decoded.get("id"), Some(value));
        }
    }

    #[test]
    fn test_decode_rejects_wrong_component_count() {
        let id = encode_state_id(&[("id", "a1"), ("project_id", "p1")]);
        let err = decode_state_id(&id, &["id", "project_id", "cluster_name"]).unwrap_err();
        assert!(matches!(err, CloudError::IdentifierFormat { .. }));

        assert!(decode_state_id("", &["id"]).is_err());
    }

    #[test]
    fn test_decode_rejects_missing_key_and_bad_base64() {
        let id = encode_state_id(&[("id", "a1"), ("other", "p1")]);
        assert!(decode_state_id(&id, &["id", "project_id"]).is_err());
        assert!(decode_state_id("id:%%%", &["id"]).is_err());
        assert!(decode_state_id("no-separator", &["a", "b"]).is_err());
    }

    #[test]
    fn test_split_import_id_two_parts() {
        let parts = split_import_id("5f1c-60ab", 2, "{project_id}-{id}").unwrap();
        assert_eq!(parts, vec!["5f1c", "60ab"]);
    }

    #[test]
    fn test_split_import_id_keeps_remainder_in_last_part() {
        let parts = split_import_id("p1-alert-with-dashes", 2, "{project_id}-{id}").unwrap();
        assert_eq!(parts, vec!["p1", "alert-with-dashes"]);
    }

    #[test]
    fn test_split_import_id_rejects_too_few_segments() {
        for bad in ["", "onlyone", "p1-", "-a1"] {
            let err = split_import_id(bad, 2, "{project_id}-{id}").unwrap_err();
            assert!(
                err.to_string().contains("{project_id}-{id}"),
                "unexpected error for {:?}: {}",
                bad,
                err
            );
        }
    }
}
