//! QL1 - boolean trees of author/type predicates
//!
//! Wire form, recursive:
//!
//! ```text
//! {"op":"and"|"or","args":[QL1, ...]}
//! {"op":"type","string":"<string>"}
//! {"op":"author","feed":"<feed-id>"}
//! ```

use crate::compiler::Collaborators;
use crate::config::CompileOptions;
use crate::error::{QueryError, Result};
use crate::input::{self, QueryInput};
use feedql_core::{IrBuilder, OperatorBuilder, OperatorNode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

const TIER: &str = "QL1";

/// A validated QL1 query tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Ql1Query {
    And { args: Vec<Ql1Query> },
    Or { args: Vec<Ql1Query> },
    Type { string: String },
    Author { feed: String },
}

impl Ql1Query {
    pub fn and(args: Vec<Ql1Query>) -> Self {
        Ql1Query::And { args }
    }

    pub fn or(args: Vec<Ql1Query>) -> Self {
        Ql1Query::Or { args }
    }

    pub fn message_type(string: impl Into<String>) -> Self {
        Ql1Query::Type {
            string: string.into(),
        }
    }

    pub fn author(feed: impl Into<String>) -> Self {
        Ql1Query::Author { feed: feed.into() }
    }

    /// Number of nodes in the tree
    pub fn node_count(&self) -> usize {
        match self {
            Ql1Query::And { args } | Ql1Query::Or { args } => {
                1 + args.iter().map(Ql1Query::node_count).sum::<usize>()
            }
            Ql1Query::Type { .. } | Ql1Query::Author { .. } => 1,
        }
    }

    fn lower<B: OperatorBuilder>(&self, dedicated: bool, builder: &B) -> B::Node {
        match self {
            Ql1Query::And { args } => builder.and(lower_all(args, dedicated, builder)),
            Ql1Query::Or { args } => builder.or(lower_all(args, dedicated, builder)),
            Ql1Query::Type { string } => builder.message_type(Some(string.as_str()), dedicated),
            Ql1Query::Author { feed } => builder.author(feed, dedicated),
        }
    }
}

fn lower_all<B: OperatorBuilder>(args: &[Ql1Query], dedicated: bool, builder: &B) -> Vec<B::Node> {
    args.iter().map(|arg| arg.lower(dedicated, builder)).collect()
}

/// Canonical text form, `op` first
impl fmt::Display for Ql1Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ql1Query::And { args } => write_combinator(f, "and", args),
            Ql1Query::Or { args } => write_combinator(f, "or", args),
            Ql1Query::Type { string } => {
                write!(f, "{{\"op\":\"type\",\"string\":{}}}", Value::from(string.as_str()))
            }
            Ql1Query::Author { feed } => {
                write!(f, "{{\"op\":\"author\",\"feed\":{}}}", Value::from(feed.as_str()))
            }
        }
    }
}

fn write_combinator(f: &mut fmt::Formatter<'_>, op: &str, args: &[Ql1Query]) -> fmt::Result {
    write!(f, "{{\"op\":\"{}\",\"args\":[", op)?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{}", arg)?;
    }
    write!(f, "]}}")
}

/// QL1 tier entry points
#[derive(Clone)]
pub struct Ql1 {
    collaborators: Collaborators,
}

impl Ql1 {
    pub fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }

    /// Validate a query tree; the first failing node's error is returned
    pub fn validate<'q>(&self, query: impl Into<QueryInput<'q>>) -> Result<()> {
        check(query.into().as_value()).map(|_| ())
    }

    /// Best-effort parse; failures are reported to the diagnostic sink
    pub fn parse<'q>(&self, query: impl Into<QueryInput<'q>>) -> Option<Ql1Query> {
        let query = query.into();
        let query = query.as_value();
        if !input::is_truthy(query) {
            return None;
        }
        match check(query) {
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
        let parsed = check(query.into().as_value())?;
        debug!(
            nodes = parsed.node_count(),
            dedicated = options.dedicated,
            "Compiling QL1 query"
        );
        Ok(parsed.lower(options.dedicated, builder))
    }

    /// Canonical text form of a valid query tree.
    ///
    /// The tree is validated first, so an invalid tree is rejected here with
    /// its validation error. Fields the tier does not know are dropped.
    pub fn stringify<'q>(&self, query: impl Into<QueryInput<'q>>) -> Result<String> {
        Ok(check(query.into().as_value())?.to_string())
    }

    /// Equivalence of two boolean trees is not decided here; always fails
    pub fn is_equals<'a, 'b>(
        &self,
        _q1: impl Into<QueryInput<'a>>,
        _q2: impl Into<QueryInput<'b>>,
    ) -> Result<bool> {
        Err(QueryError::NotSupported {
            operation: "QL1 equality",
            reason: "equivalence of arbitrary boolean trees is intractable in general",
        })
    }
}

fn check(query: &Value) -> Result<Ql1Query> {
    let obj = input::decode(query)?;
    check_node(&obj)
}

fn check_node(obj: &Map<String, Value>) -> Result<Ql1Query> {
    let op = match obj.get("op") {
        Some(op) if input::is_truthy(op) => op,
        _ => return Err(QueryError::missing("op")),
    };

    match op.as_str() {
        Some("and") => Ok(Ql1Query::And {
            args: check_args(obj)?,
        }),
        Some("or") => Ok(Ql1Query::Or {
            args: check_args(obj)?,
        }),
        Some("type") => Ok(Ql1Query::Type {
            string: string_field(obj, "string")?,
        }),
        Some("author") => Ok(Ql1Query::Author {
            feed: string_field(obj, "feed")?,
        }),
        Some(other) => Err(QueryError::UnknownOperator {
            op: other.to_string(),
        }),
        None => Err(QueryError::UnknownOperator { op: op.to_string() }),
    }
}

fn check_args(obj: &Map<String, Value>) -> Result<Vec<Ql1Query>> {
    match obj.get("args") {
        Some(Value::Array(args)) => args.iter().map(check).collect(),
        _ => Err(QueryError::ArgsNotSequence),
    }
}

fn string_field(obj: &Map<String, Value>, field: &'static str) -> Result<String> {
    match obj.get(field) {
        None => Err(QueryError::missing(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(QueryError::wrong_type(field, "a string")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_matches_serde() {
        let q = Ql1Query::or(vec![
            Ql1Query::and(vec![
                Ql1Query::message_type("vote"),
                Ql1Query::author("@alice"),
            ]),
            Ql1Query::message_type("post"),
        ]);
        assert_eq!(q.to_string(), serde_json::to_string(&q).unwrap());
    }

    #[test]
    fn test_node_count() {
        let q = Ql1Query::and(vec![
            Ql1Query::message_type("vote"),
            Ql1Query::or(vec![Ql1Query::author("@a"), Ql1Query::author("@b")]),
        ]);
        assert_eq!(q.node_count(), 5);
    }

    #[test]
    fn test_nested_json_text_is_decoded() {
        let q = json!({"op": "or", "args": [r#"{"op":"type","string":"vote"}"#]});
        assert_eq!(
            check(&q).unwrap(),
            Ql1Query::or(vec![Ql1Query::message_type("vote")])
        );
    }

    #[test]
    fn test_non_string_op() {
        assert_eq!(
            check(&json!({"op": 7})).unwrap_err(),
            QueryError::UnknownOperator { op: "7".to_string() }
        );
        assert_eq!(check(&json!({"op": ""})).unwrap_err(), QueryError::missing("op"));
    }

    #[test]
    fn test_leaf_extra_fields_ignored() {
        let q = json!({"op": "type", "string": "vote", "note": 1});
        assert_eq!(check(&q).unwrap(), Ql1Query::message_type("vote"));
    }

    #[test]
    fn test_wrong_leaf_field_type() {
        assert_eq!(
            check(&json!({"op": "author", "feed": 1})).unwrap_err(),
            QueryError::wrong_type("feed", "a string")
        );
    }
}
