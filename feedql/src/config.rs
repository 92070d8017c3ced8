//! Compiler configuration

use feedql_core::{FeedIdValidator, SigilFeedIdValidator, SsbFeedIdValidator};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Configuration load error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Per-compile options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Allow the engine to provision new indexes for every leaf predicate.
    /// Leave unset unless the query comes from a trusted local actor.
    pub dedicated: bool,
}

impl CompileOptions {
    pub fn dedicated() -> Self {
        Self { dedicated: true }
    }
}

/// Feed-id format check applied to QL0 authors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedIdCheck {
    /// Full SSB feed reference: `@<base64 key>=.ed25519`
    #[default]
    Ssb,
    /// Only the `@` sigil
    Sigil,
}

impl FeedIdCheck {
    pub fn validator(self) -> Arc<dyn FeedIdValidator> {
        match self {
            FeedIdCheck::Ssb => Arc::new(SsbFeedIdValidator),
            FeedIdCheck::Sigil => Arc::new(SigilFeedIdValidator),
        }
    }
}

/// Query compiler configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Default for [`CompileOptions::dedicated`]
    pub dedicated: bool,
    /// Author format check
    pub feed_id_check: FeedIdCheck,
}

impl CompilerConfig {
    /// Load configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            dedicated: self.dedicated,
        }
    }
}
