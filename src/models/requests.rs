//! Request DTOs for the front-end API
//!
//! Defines the structure of incoming query strings.

use serde::Deserialize;

/// Query string of `GET /api?key=<key>`
///
/// A missing `key` deserializes to an empty string, which the group rejects
/// as an invalid argument.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyQuery {
    #[serde(default)]
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_query_defaults_to_empty() {
        let query: KeyQuery = serde_json::from_str("{}").unwrap();
        assert!(query.key.is_empty());

        let query: KeyQuery = serde_json::from_str(r#"{"key":"Tom"}"#).unwrap();
        assert_eq!(query.key, "Tom");
    }
}
