//! FeedQL
//!
//! Validates, canonicalizes and compiles FeedQL read-time filters into the
//! operator tree consumed by the log database's query engine.
//!
//! - QL0: one flat filter, author + type + privacy class
//! - QL1: `and`/`or` trees of `author` and `type` predicates

pub mod compiler;
pub mod config;
pub mod error;
pub mod input;
pub mod ql0;
pub mod ql1;

// Re-exports
pub use compiler::{Collaborators, ParsedQuery, QueryCompiler, Tier};
pub use config::{CompileOptions, CompilerConfig, ConfigError, FeedIdCheck};
pub use error::{QueryError, Result};
pub use input::QueryInput;
pub use feedql_core::OperatorNode;
pub use ql0::{Ql0, Ql0Query};
pub use ql1::{Ql1, Ql1Query};
