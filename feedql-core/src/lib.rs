//! FeedQL Core
//!
//! Shared building blocks for the FeedQL query tiers: the operator tree that
//! compiled queries are lowered into, and the collaborator seams the
//! compilers call out to (execution-engine constructors, feed-id format
//! checks and diagnostic emission).

pub mod diagnostics;
pub mod feed_id;
pub mod operator;

// Re-exports
pub use diagnostics::{DiagnosticSink, TracingSink};
pub use feed_id::{FeedIdValidator, SigilFeedIdValidator, SsbFeedIdValidator};
pub use operator::{IrBuilder, OperatorBuilder, OperatorNode};
