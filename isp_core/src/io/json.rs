//! JSON input boundary for ISP instances
//!
//! The on-disk format is the original instance format of the problem data
//! set: seven top-level keys, four identifier lists and three relation maps.
//! All keys are required; a missing key fails deserialization and is reported
//! as a fatal [`LoadError`] before any model construction begins.
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::instance::{Instance, LoadError};

/// Serde image of an instance file
#[derive(Serialize, Deserialize)]
struct JsonInstance {
    #[serde(rename = "Interpreters")]
    interpreters: Vec<String>,
    #[serde(rename = "Languages")]
    languages: Vec<String>,
    #[serde(rename = "Sessions")]
    sessions: Vec<String>,
    #[serde(rename = "Blocks")]
    blocks: Vec<String>,
    /// Interpreter id → known language ids
    #[serde(rename = "Languages_i")]
    interpreter_languages: IndexMap<String, Vec<String>>,
    /// Session id → required language ids
    #[serde(rename = "Languages_s")]
    session_languages: IndexMap<String, Vec<String>>,
    /// Block id → session ids scheduled in that block
    #[serde(rename = "Sessions_b")]
    block_sessions: IndexMap<String, Vec<String>>,
}

impl Instance {
    /// Load and validate an instance from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Instance, LoadError> {
        let data = fs::read_to_string(path)?;
        Instance::from_json_str(&data)
    }

    /// Load and validate an instance from a JSON string
    pub fn from_json_str(data: &str) -> Result<Instance, LoadError> {
        let json: JsonInstance = serde_json::from_str(data)?;
        Instance::new(
            json.interpreters,
            json.languages,
            json.sessions,
            json.blocks,
            &json.interpreter_languages,
            &json.session_languages,
            &json.block_sessions,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"{
        "Interpreters": ["i1", "i2"],
        "Languages": ["en", "fr", "de"],
        "Sessions": ["s1", "s2"],
        "Blocks": ["b1"],
        "Languages_i": {"i1": ["en", "fr"], "i2": ["fr", "de"]},
        "Languages_s": {"s1": ["en", "fr"], "s2": ["fr", "de"]},
        "Sessions_b": {"b1": ["s1", "s2"]}
    }"#;

    #[test]
    fn parse_small_instance() {
        let instance = Instance::from_json_str(SMALL).unwrap();
        assert_eq!(instance.interpreters(), &["i1", "i2"]);
        assert_eq!(instance.languages(), &["en", "fr", "de"]);
        assert_eq!(instance.block_sessions(0), &[0, 1]);
        assert!(instance.knows(1, 2));
    }

    #[test]
    fn missing_key_is_fatal() {
        // No Sessions_b key
        let data = r#"{
            "Interpreters": ["i1"],
            "Languages": ["en"],
            "Sessions": ["s1"],
            "Blocks": ["b1"],
            "Languages_i": {"i1": ["en"]},
            "Languages_s": {"s1": ["en"]}
        }"#;
        assert!(matches!(
            Instance::from_json_str(data),
            Err(LoadError::Parse(_))
        ));
    }

    #[test]
    fn malformed_json_is_fatal() {
        assert!(matches!(
            Instance::from_json_str("{not json"),
            Err(LoadError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_fatal() {
        assert!(matches!(
            Instance::from_json_file("/nonexistent/instance.json"),
            Err(LoadError::Io(_))
        ));
    }
}
