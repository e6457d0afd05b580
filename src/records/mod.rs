//! User records read from an input file.
//!
//! - [`decoder`] - Turns input lines into [`UserRecord`]s (JSON lines or column-mapped CSV)
//! - [`filter`] - Username pattern gate applied before reconciliation

pub mod decoder;
pub mod filter;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A single desired user state.
///
/// In JSON-lines mode each line deserializes directly into this structure:
///
/// ```json
/// {"username":"alice","password":"S3cret!pw","attributes":{"email":"alice@example.com"}}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UserRecord {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, Value>,
    /// Passed through to the directory as `ClientMetadata`
    #[serde(
        default,
        rename = "clientMetadata",
        alias = "client_metadata",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub client_metadata: HashMap<String, String>,
}

impl UserRecord {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    /// Attributes coerced to their display form, sorted by name.
    pub fn attribute_strings(&self) -> Vec<(String, String)> {
        let mut attrs: Vec<(String, String)> = self
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), display_value(value)))
            .collect();
        attrs.sort();
        attrs
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
