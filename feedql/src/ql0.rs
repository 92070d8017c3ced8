//! QL0 - flat author/type/privacy queries
//!
//! Wire form: `{"author":"<feed-id>","type":"<string>"|null,"private":<bool>}`.
//! Exactly those three keys; a private query never names a type. The
//! canonical text form keeps that key order regardless of how the query was
//! built, so it can serve as a cache or dedup key.

use crate::compiler::Collaborators;
use crate::config::CompileOptions;
use crate::error::{QueryError, Result};
use crate::input::{self, QueryInput};
use feedql_core::{IrBuilder, OperatorBuilder, OperatorNode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

const TIER: &str = "QL0";

/// Fields of a QL0 record, in canonical order
pub const EXPECTED_FIELDS: [&str; 3] = ["author", "type", "private"];

/// Fields of the pre-`private` QL0 record
pub const LEGACY_FIELDS: [&str; 2] = ["author", "type"];

/// A validated QL0 query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ql0Query {
    /// Feed id of the author
    pub author: String,
    /// Message type; always `None` for private queries
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Encrypted messages instead of plaintext ones
    pub private: bool,
}

impl Ql0Query {
    pub fn public(author: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            kind: Some(kind.into()),
            private: false,
        }
    }

    pub fn private(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            kind: None,
            private: true,
        }
    }

    /// Structured form of the query
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("author".to_string(), Value::from(self.author.as_str()));
        map.insert(
            "type".to_string(),
            self.kind.as_deref().map_or(Value::Null, Value::from),
        );
        map.insert("private".to_string(), Value::Bool(self.private));
        Value::Object(map)
    }
}

/// Canonical text form: `author`, `type`, `private`, in that order
impl fmt::Display for Ql0Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.kind.as_deref().map_or(Value::Null, Value::from);
        write!(
            f,
            "{{\"author\":{},\"type\":{},\"private\":{}}}",
            Value::from(self.author.as_str()),
            kind,
            self.private
        )
    }
}

/// QL0 tier entry points
#[derive(Clone)]
pub struct Ql0 {
    collaborators: Collaborators,
}

impl Ql0 {
    pub fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }

    /// Validate a query, reporting the first violated rule
    pub fn validate<'q>(&self, query: impl Into<QueryInput<'q>>) -> Result<()> {
        self.check(query.into().as_value()).map(|_| ())
    }

    /// Best-effort parse; failures are reported to the diagnostic sink
    pub fn parse<'q>(&self, query: impl Into<QueryInput<'q>>) -> Option<Ql0Query> {
        let query = query.into();
        let query = query.as_value();
        if !input::is_truthy(query) {
            return None;
        }
        match self.check(query) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                self.collaborators.diagnostics.parse_failed(
                    TIER,
                    &input::render(query),
                    &e.to_string(),
                );
                None
            }
        }
    }

    /// Compile to the operator tree with shared indexes only
    pub fn compile<'q>(&self, query: impl Into<QueryInput<'q>>) -> Result<OperatorNode> {
        self.compile_with_options(query, CompileOptions::default())
    }

    pub fn compile_with_options<'q>(
        &self,
        query: impl Into<QueryInput<'q>>,
        options: CompileOptions,
    ) -> Result<OperatorNode> {
        self.compile_with(query, options, &IrBuilder)
    }

    /// Compile against an engine's own node constructors
    pub fn compile_with<'q, B: OperatorBuilder>(
        &self,
        query: impl Into<QueryInput<'q>>,
        options: CompileOptions,
        builder: &B,
    ) -> Result<B::Node> {
        let parsed = self.check(query.into().as_value())?;
        let dedicated = options.dedicated;
        debug!(author = %parsed.author, private = parsed.private, dedicated, "Compiling QL0 query");

        let author = builder.author(&parsed.author, dedicated);
        if parsed.private {
            Ok(builder.and(vec![author, builder.is_private()]))
        } else {
            Ok(builder.and(vec![
                author,
                builder.message_type(parsed.kind.as_deref(), dedicated),
                builder.is_public(),
            ]))
        }
    }

    /// Canonical text form of a valid query
    pub fn stringify<'q>(&self, query: impl Into<QueryInput<'q>>) -> Result<String> {
        Ok(self.check(query.into().as_value())?.to_string())
    }

    /// Structural equality of two best-effort parsed queries.
    ///
    /// False whenever either side fails to parse, including when both do.
    pub fn is_equals<'a, 'b>(
        &self,
        q1: impl Into<QueryInput<'a>>,
        q2: impl Into<QueryInput<'b>>,
    ) -> bool {
        match (self.parse(q1), self.parse(q2)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Upgrade a legacy `{"author","type"}` record to the current shape.
    ///
    /// Legacy queries predate private messages, so they always select public
    /// messages of a non-null type.
    pub fn migrate_legacy<'q>(&self, query: impl Into<QueryInput<'q>>) -> Result<Ql0Query> {
        let query = query.into();
        let obj = input::decode(query.as_value())?;
        if obj.len() > LEGACY_FIELDS.len() {
            return Err(QueryError::TooManyFields {
                expected: LEGACY_FIELDS.len(),
                found: obj.len(),
            });
        }
        let author = string_field(&obj, "author")?;
        let kind = string_field(&obj, "type")?;
        self.check_feed_id(author)?;
        Ok(Ql0Query::public(author, kind))
    }

    fn check(&self, query: &Value) -> Result<Ql0Query> {
        let obj = input::decode(query)?;
        if obj.len() > EXPECTED_FIELDS.len() {
            return Err(QueryError::TooManyFields {
                expected: EXPECTED_FIELDS.len(),
                found: obj.len(),
            });
        }

        let author = string_field(&obj, "author")?;
        let kind = match obj.get("type") {
            None => return Err(QueryError::missing("type")),
            Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.as_str()),
            Some(_) => return Err(QueryError::wrong_type("type", "a string or null")),
        };
        let private = match obj.get("private") {
            None => return Err(QueryError::missing("private")),
            Some(Value::Bool(b)) => *b,
            Some(_) => return Err(QueryError::wrong_type("private", "a boolean")),
        };

        if private && kind.is_some() {
            return Err(QueryError::invariant(
                "if \"private\" is true, then \"type\" must be null",
            ));
        }
        self.check_feed_id(author)?;

        Ok(Ql0Query {
            author: author.to_string(),
            kind: kind.map(str::to_string),
            private,
        })
    }

    fn check_feed_id(&self, author: &str) -> Result<()> {
        if self.collaborators.feed_ids.is_valid_feed_id(author) {
            Ok(())
        } else {
            Err(QueryError::InvalidFeedId {
                feed_id: author.to_string(),
            })
        }
    }
}

fn string_field<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a str> {
    match obj.get(field) {
        None => Err(QueryError::missing(field)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(QueryError::wrong_type(field, "a string")),
    }
}
