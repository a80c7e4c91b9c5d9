use rowmap_schema::{DEFAULT_TABLE_PREFIX, MAX_FIELD_NAME_LEN, MAX_SCHEMA_NAME_LEN};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// Longest table prefix that still fits every legal schema name in a
/// store identifier.
pub const MAX_TABLE_PREFIX_LEN: usize = MAX_FIELD_NAME_LEN - MAX_SCHEMA_NAME_LEN;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("table prefix '{0}' must be between 1 and {max} bytes", max = MAX_TABLE_PREFIX_LEN)]
    TablePrefix(String),
}

///
/// Config
///
/// Session policy. Every key is optional in a configuration document;
/// unknown keys are rejected.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Validation tolerates store columns no field declares.
    pub allow_extra_columns: bool,

    /// Depth used by `create_detached_copy_default`.
    pub default_max_depth: u32,

    pub table_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allow_extra_columns: false,
            default_max_depth: u32::MAX,
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and check a JSON configuration document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let len = self.table_prefix.len();
        if len == 0 || len > MAX_TABLE_PREFIX_LEN {
            return Err(ConfigError::TablePrefix(self.table_prefix.clone()));
        }

        Ok(())
    }

    #[must_use]
    pub const fn allow_extra_columns(mut self, allow: bool) -> Self {
        self.allow_extra_columns = allow;
        self
    }

    #[must_use]
    pub const fn default_max_depth(mut self, depth: u32) -> Self {
        self.default_max_depth = depth;
        self
    }

    #[must_use]
    pub fn table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = Config::from_json_str("{}").expect("empty document should parse");

        assert_eq!(config, Config::default());
        assert_eq!(config.table_prefix, "class_");
        assert!(!config.allow_extra_columns);
    }

    #[test]
    fn partial_document_overrides_named_keys() {
        let config = Config::from_json_str(r#"{"allow_extra_columns": true, "default_max_depth": 3}"#)
            .expect("document should parse");

        assert!(config.allow_extra_columns);
        assert_eq!(config.default_max_depth, 3);
        assert_eq!(config.table_prefix, "class_");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_json_str(r#"{"allow_extra_column": true}"#)
            .expect_err("misspelled key should be rejected");

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn overlong_prefix_is_rejected() {
        let err = Config::from_json_str(r#"{"table_prefix": "rowmap_table_"}"#)
            .expect_err("prefix should be too long");

        assert!(matches!(err, ConfigError::TablePrefix(_)));
    }
}
