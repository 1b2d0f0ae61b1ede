// Configuration module for structviz
// Reads from environment variables with sensible defaults

use crate::ast;
use anyhow::{Result, bail};
use serde_json::Value;
use std::env;
use std::sync::OnceLock;
use tracing::warn;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Largest source text accepted, in bytes (STRUCTVIZ_MAX_SOURCE_BYTES)
    pub max_source_bytes: usize,

    /// Deepest AST accepted, in JSON nesting levels (STRUCTVIZ_MAX_AST_DEPTH)
    pub max_ast_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_source_bytes: 2 * 1024 * 1024,
            max_ast_depth: 512,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(val) = env::var("STRUCTVIZ_MAX_SOURCE_BYTES") {
            match val.parse() {
                Ok(parsed) => config.max_source_bytes = parsed,
                Err(_) => warn!(
                    value = %val,
                    default = config.max_source_bytes,
                    "invalid STRUCTVIZ_MAX_SOURCE_BYTES, using default"
                ),
            }
        }

        if let Ok(val) = env::var("STRUCTVIZ_MAX_AST_DEPTH") {
            match val.parse() {
                Ok(parsed) => config.max_ast_depth = parsed,
                Err(_) => warn!(
                    value = %val,
                    default = config.max_ast_depth,
                    "invalid STRUCTVIZ_MAX_AST_DEPTH, using default"
                ),
            }
        }

        config
    }

    /// Get the global configuration instance
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(Config::from_env)
    }

    pub fn check_source(&self, source: &str) -> Result<()> {
        if source.len() > self.max_source_bytes {
            bail!(
                "source is {} bytes, limit is {} (STRUCTVIZ_MAX_SOURCE_BYTES)",
                source.len(),
                self.max_source_bytes
            );
        }
        Ok(())
    }

    pub fn check_ast(&self, tree: &Value) -> Result<()> {
        self.check_depth(ast::depth(tree))
    }

    /// Same ceiling as [`Config::check_ast`], applied to JSON text before it
    /// is decoded.
    pub fn check_ast_text(&self, text: &str) -> Result<()> {
        self.check_depth(ast::text_depth(text))
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_ast_depth {
            bail!(
                "AST nests {depth} levels deep, limit is {} (STRUCTVIZ_MAX_AST_DEPTH)",
                self.max_ast_depth
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_source_bytes, 2 * 1024 * 1024);
        assert_eq!(config.max_ast_depth, 512);
    }

    #[test]
    fn limits_are_enforced() {
        let config = Config {
            max_source_bytes: 4,
            max_ast_depth: 2,
        };
        assert!(config.check_source("abcd").is_ok());
        assert!(config.check_source("abcde").is_err());
        assert!(config.check_ast(&json!({"type": "Module"})).is_ok());
        let deep = json!({"a": {"b": {"c": {"d": 1}}}});
        assert!(config.check_ast(&deep).is_err());
        assert!(config.check_ast_text(r#"{"a": "{{{{"}"#).is_ok());
        assert!(config.check_ast_text(r#"{"a": [[1]]}"#).is_err());
    }
}
