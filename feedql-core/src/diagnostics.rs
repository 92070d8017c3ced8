//! Diagnostic emission for best-effort parsing
//!
//! Query payloads often arrive from remote peers, so the `parse` entry points
//! swallow failures. Each swallowed failure is reported exactly once through
//! a [`DiagnosticSink`] supplied by the caller.

use tracing::warn;

/// Receiver of best-effort parse diagnostics
pub trait DiagnosticSink: Send + Sync {
    /// Report a query that could not be parsed
    fn parse_failed(&self, tier: &str, query: &str, error: &str);
}

/// Sink forwarding diagnostics to `tracing` at WARN level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn parse_failed(&self, tier: &str, query: &str, error: &str) {
        warn!(tier, query, error, "Error parsing query");
    }
}
