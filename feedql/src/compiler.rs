//! FeedQL Compiler - Main interface
//!
//! Bundles both query tiers with their collaborators and configuration.

use crate::config::CompilerConfig;
use crate::error::Result;
use crate::input::QueryInput;
use crate::ql0::{Ql0, Ql0Query};
use crate::ql1::{Ql1, Ql1Query};
use feedql_core::{
    DiagnosticSink, FeedIdValidator, OperatorNode, SsbFeedIdValidator, TracingSink,
};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// External services the tiers call out to
#[derive(Clone)]
pub struct Collaborators {
    /// Author format check
    pub feed_ids: Arc<dyn FeedIdValidator>,
    /// Receiver of best-effort parse failures
    pub diagnostics: Arc<dyn DiagnosticSink>,
}

impl Collaborators {
    pub fn with_feed_ids(mut self, feed_ids: Arc<dyn FeedIdValidator>) -> Self {
        self.feed_ids = feed_ids;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            feed_ids: Arc::new(SsbFeedIdValidator),
            diagnostics: Arc::new(TracingSink),
        }
    }
}

/// Query language tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Ql0,
    Ql1,
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ql0" => Ok(Tier::Ql0),
            "ql1" => Ok(Tier::Ql1),
            other => Err(format!("unknown query tier: {} (expected ql0 or ql1)", other)),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Ql0 => write!(f, "QL0"),
            Tier::Ql1 => write!(f, "QL1"),
        }
    }
}

/// Result of a successful best-effort parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParsedQuery {
    Ql0(Ql0Query),
    Ql1(Ql1Query),
}

impl fmt::Display for ParsedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsedQuery::Ql0(q) => write!(f, "{}", q),
            ParsedQuery::Ql1(q) => write!(f, "{}", q),
        }
    }
}

/// FeedQL Compiler
pub struct QueryCompiler {
    config: CompilerConfig,
    ql0: Ql0,
    ql1: Ql1,
}

impl QueryCompiler {
    /// Create a compiler logging through `tracing`, with the configured feed-id check
    pub fn new(config: CompilerConfig) -> Self {
        let collaborators =
            Collaborators::default().with_feed_ids(config.feed_id_check.validator());
        Self::with_collaborators(config, collaborators)
    }

    pub fn with_collaborators(config: CompilerConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            ql0: Ql0::new(collaborators.clone()),
            ql1: Ql1::new(collaborators),
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn ql0(&self) -> &Ql0 {
        &self.ql0
    }

    pub fn ql1(&self) -> &Ql1 {
        &self.ql1
    }

    pub fn validate<'q>(&self, tier: Tier, query: impl Into<QueryInput<'q>>) -> Result<()> {
        match tier {
            Tier::Ql0 => self.ql0.validate(query),
            Tier::Ql1 => self.ql1.validate(query),
        }
    }

    pub fn parse<'q>(&self, tier: Tier, query: impl Into<QueryInput<'q>>) -> Option<ParsedQuery> {
        match tier {
            Tier::Ql0 => self.ql0.parse(query).map(ParsedQuery::Ql0),
            Tier::Ql1 => self.ql1.parse(query).map(ParsedQuery::Ql1),
        }
    }

    /// Compile with the configured `dedicated` default
    pub fn compile<'q>(&self, tier: Tier, query: impl Into<QueryInput<'q>>) -> Result<OperatorNode> {
        let options = self.config.compile_options();
        match tier {
            Tier::Ql0 => self.ql0.compile_with_options(query, options),
            Tier::Ql1 => self.ql1.compile_with_options(query, options),
        }
    }

    pub fn stringify<'q>(&self, tier: Tier, query: impl Into<QueryInput<'q>>) -> Result<String> {
        match tier {
            Tier::Ql0 => self.ql0.stringify(query),
            Tier::Ql1 => self.ql1.stringify(query),
        }
    }

    pub fn is_equals<'a, 'b>(
        &self,
        tier: Tier,
        q1: impl Into<QueryInput<'a>>,
        q2: impl Into<QueryInput<'b>>,
    ) -> Result<bool> {
        match tier {
            Tier::Ql0 => Ok(self.ql0.is_equals(q1, q2)),
            Tier::Ql1 => self.ql1.is_equals(q1, q2),
        }
    }
}

impl Default for QueryCompiler {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}
