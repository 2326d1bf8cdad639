//! Engine options, merged additively across `configure` calls.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::record::{Record, Value};

/// Text substituted for a single unresolved placeholder.
pub const DEFAULT_FALLBACK: &str = "unknown";

/// Default placeholder opening marker.
pub const DEFAULT_OPEN: &str = "${";

/// Default placeholder closing marker.
pub const DEFAULT_CLOSE: &str = "}";

/// Option keys understood by the engine.
pub mod keys {
    /// Consult durable storage while merging.
    pub const SAVE: &str = "save";
    /// Whole-string replacement for strings with unresolved placeholders.
    pub const REPLACEMENT: &str = "replacement";
    /// Per-placeholder fallback text.
    pub const FALLBACK: &str = "fallback";
    /// Placeholder opening marker.
    pub const OPEN: &str = "open";
    /// Placeholder closing marker.
    pub const CLOSE: &str = "close";
}

/// The options of one engine instance.
///
/// Options are a flat record; keys the engine does not know are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineConfig {
    options: Record,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut options = Record::new();
        options.insert(keys::SAVE.to_owned(), Value::Bool(false));
        options.insert(keys::FALLBACK.to_owned(), Value::from(DEFAULT_FALLBACK));
        options.insert(keys::OPEN.to_owned(), Value::from(DEFAULT_OPEN));
        options.insert(keys::CLOSE.to_owned(), Value::from(DEFAULT_CLOSE));
        Self { options }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow-merge `options` over the current ones. Later keys win,
    /// keys not mentioned survive.
    pub fn merge(&mut self, options: Record) {
        for (key, value) in options {
            self.options.insert(key, value);
        }
    }

    /// Parse options from a TOML document, ready for [`EngineConfig::merge`].
    pub fn options_from_toml(document: &str) -> Result<Record, ConfigError> {
        Ok(toml::from_str(document)?)
    }

    pub fn options(&self) -> &Record {
        &self.options
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Whether durable storage is consulted during merges.
    pub fn save(&self) -> bool {
        match self.options.get(keys::SAVE) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(save)) => *save,
            Some(other) => {
                warn!(option = keys::SAVE, value = %other, "expected a boolean option, using default");
                false
            }
        }
    }

    /// Whole-string replacement text, if enabled.
    pub fn replacement(&self) -> Option<&str> {
        self.string_option(keys::REPLACEMENT)
    }

    pub fn fallback(&self) -> &str {
        self.string_option(keys::FALLBACK).unwrap_or(DEFAULT_FALLBACK)
    }

    /// Placeholder markers as `(open, close)`.
    pub fn delimiters(&self) -> (&str, &str) {
        (
            self.string_option(keys::OPEN).unwrap_or(DEFAULT_OPEN),
            self.string_option(keys::CLOSE).unwrap_or(DEFAULT_CLOSE),
        )
    }

    fn string_option(&self, key: &str) -> Option<&str> {
        match self.options.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(value)) => Some(value.as_str()),
            Some(other) => {
                warn!(option = key, value = %other, "expected a string option, ignoring");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(!config.save());
        assert_eq!(config.replacement(), None);
        assert_eq!(config.fallback(), "unknown");
        assert_eq!(config.delimiters(), ("${", "}"));
    }

    #[test]
    fn test_merge_is_additive() {
        let mut config = EngineConfig::default();
        config.merge(options(json!({"foo": "bar"})));
        config.merge(options(json!({"baz": "qux"})));

        assert_eq!(config.get("foo"), Some(&json!("bar")));
        assert_eq!(config.get("baz"), Some(&json!("qux")));
        assert!(!config.save());
    }

    #[test]
    fn test_merge_later_keys_win() {
        let mut config = EngineConfig::default();
        config.merge(options(json!({"save": true, "replacement": "..."})));
        config.merge(options(json!({"save": false})));

        assert!(!config.save());
        assert_eq!(config.replacement(), Some("..."));
    }

    #[test]
    fn test_null_unsets_replacement() {
        let mut config = EngineConfig::default();
        config.merge(options(json!({"replacement": "¯\\_(ツ)_/¯"})));
        config.merge(options(json!({"replacement": null})));
        assert_eq!(config.replacement(), None);
    }

    #[test]
    fn test_wrongly_typed_options_read_as_default() {
        let mut config = EngineConfig::default();
        config.merge(options(json!({"save": "yes", "fallback": 3})));
        assert!(!config.save());
        assert_eq!(config.fallback(), "unknown");
    }

    #[test]
    fn test_options_from_toml() {
        let parsed = EngineConfig::options_from_toml(
            r#"
            save = true
            replacement = "sorry, I forgot"
            open = "{{"
            close = "}}"
            "#,
        )
        .unwrap();

        let mut config = EngineConfig::default();
        config.merge(parsed);
        assert!(config.save());
        assert_eq!(config.replacement(), Some("sorry, I forgot"));
        assert_eq!(config.delimiters(), ("{{", "}}"));
    }

    #[test]
    fn test_options_from_toml_invalid() {
        assert!(EngineConfig::options_from_toml("save = ").is_err());
    }
}
