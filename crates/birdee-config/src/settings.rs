//! The `birdeeLanguageServer` settings section.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::defaults::SETTINGS_SECTION;
use crate::error::ConfigError;

/// User settings read from the host's `birdeeLanguageServer` section.
///
/// Unset keys default to the empty string, which the resolver treats as "use
/// the fallback".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BirdeeSettings {
    /// Explicit path to the `birdeec` executable.
    pub compiler_path: String,
    /// Cache directory, joined onto the first workspace root.
    pub lsp_cache: String,
    /// Source root used by the server to locate module sources.
    pub source_root: String,
}

impl BirdeeSettings {
    /// Decodes settings from a JSON value.
    ///
    /// Accepts either the bare section object or a document that nests it under
    /// `birdeeLanguageServer`, which is how hosts usually hand over their
    /// whole settings tree.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Settings`] when the section has the wrong shape.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let section = match value {
            Value::Object(mut map) if map.contains_key(SETTINGS_SECTION) => map
                .remove(SETTINGS_SECTION)
                .unwrap_or(Value::Object(Map::new())),
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        serde_json::from_value(section).map_err(|source| ConfigError::Settings {
            section: SETTINGS_SECTION,
            source,
        })
    }

    /// Decodes settings from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Settings`] for malformed JSON or a section with
    /// the wrong shape.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let value = serde_json::from_str(text).map_err(|source| ConfigError::Settings {
            section: SETTINGS_SECTION,
            source,
        })?;
        Self::from_value(value)
    }

    /// Encodes the settings as the bare section object.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Settings`] if serialisation fails.
    pub fn to_section_value(&self) -> Result<Value, ConfigError> {
        serde_json::to_value(self).map_err(|source| ConfigError::Settings {
            section: SETTINGS_SECTION,
            source,
        })
    }

    /// Encodes the settings nested under the section name, the shape pushed to
    /// the server with `workspace/didChangeConfiguration`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Settings`] if serialisation fails.
    pub fn to_scoped_value(&self) -> Result<Value, ConfigError> {
        let mut scoped = Map::new();
        scoped.insert(SETTINGS_SECTION.to_owned(), self.to_section_value()?);
        Ok(Value::Object(scoped))
    }

    /// Answers a `workspace/configuration` item.
    ///
    /// No section yields the scoped document, the section name yields the
    /// section object and `birdeeLanguageServer.<key>` yields a single value.
    /// Anything else, including unknown keys, is `null`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Settings`] if serialisation fails.
    pub fn lookup(&self, section: Option<&str>) -> Result<Value, ConfigError> {
        let Some(section) = section else {
            return self.to_scoped_value();
        };
        if section == SETTINGS_SECTION {
            return self.to_section_value();
        }
        let key = section
            .strip_prefix(SETTINGS_SECTION)
            .and_then(|rest| rest.strip_prefix('.'));
        match (key, self.to_section_value()?) {
            (Some(key), Value::Object(mut fields)) => {
                Ok(fields.remove(key).unwrap_or(Value::Null))
            }
            _ => Ok(Value::Null),
        }
    }
}
