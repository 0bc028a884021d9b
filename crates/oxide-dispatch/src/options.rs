//! Dispatcher options.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Options shared by every dispatch cycle.
///
/// Every field has a default, so an options file only needs the keys it
/// changes:
///
/// ```
/// use oxide_dispatch::Options;
///
/// let options = Options::from_json(r#"{ "debug_mode": true }"#).unwrap();
/// assert!(options.debug_mode);
/// assert!(!options.json_errors);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Prefix the application is mounted under, stripped from request URIs.
    pub root_uri: String,
    /// Show fault details to callers instead of a generic message.
    pub debug_mode: bool,
    /// Send fault responses as JSON instead of plain text.
    pub json_errors: bool,
    /// Default for including a `status` field in JSON responses.
    pub include_status_code_in_json: bool,
}

impl Options {
    /// Parses options from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads options from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::from_json("{}").unwrap();
        assert_eq!(options, Options::default());
        assert!(options.root_uri.is_empty());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(
            &path,
            r#"{"root_uri": "/app", "include_status_code_in_json": true}"#,
        )
        .unwrap();

        let options = Options::from_file(&path).unwrap();
        assert_eq!(options.root_uri, "/app");
        assert!(options.include_status_code_in_json);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            Options::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            Options::from_file("/definitely/not/here.json"),
            Err(ConfigError::Io { .. })
        ));
    }
}
