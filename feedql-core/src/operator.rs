//! Operator tree (IR) for compiled FeedQL queries
//!
//! The operator tree is the engine-facing form of a query. It is pure data:
//! combinator nodes over predicate leaves, built once per compile call and
//! never mutated afterwards. The execution engine that walks it against the
//! log's indexes lives outside this workspace and is reached only through
//! the [`OperatorBuilder`] constructors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operator tree node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatorNode {
    /// Conjunction of child operators
    And { children: Vec<OperatorNode> },
    /// Disjunction of child operators
    Or { children: Vec<OperatorNode> },
    /// Messages authored by the given feed
    AuthorPredicate { feed_id: String, dedicated: bool },
    /// Messages whose content type matches; `None` matches untyped content
    TypePredicate {
        value: Option<String>,
        dedicated: bool,
    },
    /// Encrypted messages only
    IsPrivate,
    /// Plaintext messages only
    IsPublic,
}

/// IR node constructors exposed by an execution engine.
///
/// The compilers only ever call these constructors; they never inspect or
/// evaluate what comes back. `dedicated = true` allows the engine to
/// provision a new backing index for the leaf, `false` restricts it to the
/// shared indexes that already exist.
pub trait OperatorBuilder {
    /// Node type produced by this engine
    type Node;

    fn and(&self, children: Vec<Self::Node>) -> Self::Node;

    fn or(&self, children: Vec<Self::Node>) -> Self::Node;

    fn author(&self, feed_id: &str, dedicated: bool) -> Self::Node;

    fn message_type(&self, value: Option<&str>, dedicated: bool) -> Self::Node;

    fn is_private(&self) -> Self::Node;

    fn is_public(&self) -> Self::Node;
}

/// Builder producing plain [`OperatorNode`] trees
#[derive(Debug, Clone, Copy, Default)]
pub struct IrBuilder;

impl OperatorBuilder for IrBuilder {
    type Node = OperatorNode;

    fn and(&self, children: Vec<OperatorNode>) -> OperatorNode {
        OperatorNode::And { children }
    }

    fn or(&self, children: Vec<OperatorNode>) -> OperatorNode {
        OperatorNode::Or { children }
    }

    fn author(&self, feed_id: &str, dedicated: bool) -> OperatorNode {
        OperatorNode::AuthorPredicate {
            feed_id: feed_id.to_string(),
            dedicated,
        }
    }

    fn message_type(&self, value: Option<&str>, dedicated: bool) -> OperatorNode {
        OperatorNode::TypePredicate {
            value: value.map(str::to_string),
            dedicated,
        }
    }

    fn is_private(&self) -> OperatorNode {
        OperatorNode::IsPrivate
    }

    fn is_public(&self) -> OperatorNode {
        OperatorNode::IsPublic
    }
}

impl OperatorNode {
    /// Get all leaf nodes, depth-first, left to right
    pub fn leaves(&self) -> Vec<&OperatorNode> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a OperatorNode>) {
        match self {
            OperatorNode::And { children } | OperatorNode::Or { children } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
            leaf => out.push(leaf),
        }
    }

    /// Get the `dedicated` flag of every author/type predicate in the tree
    pub fn dedicated_flags(&self) -> Vec<bool> {
        self.leaves()
            .into_iter()
            .filter_map(|leaf| match leaf {
                OperatorNode::AuthorPredicate { dedicated, .. }
                | OperatorNode::TypePredicate { dedicated, .. } => Some(*dedicated),
                _ => None,
            })
            .collect()
    }

    /// Whether any predicate in the tree may provision a dedicated index
    pub fn requires_dedicated_index(&self) -> bool {
        self.dedicated_flags().into_iter().any(|d| d)
    }
}

impl fmt::Display for OperatorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorNode::And { children } => write_combinator(f, "and", children),
            OperatorNode::Or { children } => write_combinator(f, "or", children),
            OperatorNode::AuthorPredicate { feed_id, dedicated } => {
                write!(f, "author({}", feed_id)?;
                if *dedicated {
                    write!(f, ", dedicated")?;
                }
                write!(f, ")")
            }
            OperatorNode::TypePredicate { value, dedicated } => {
                write!(f, "type({}", value.as_deref().unwrap_or("null"))?;
                if *dedicated {
                    write!(f, ", dedicated")?;
                }
                write!(f, ")")
            }
            OperatorNode::IsPrivate => write!(f, "isPrivate()"),
            OperatorNode::IsPublic => write!(f, "isPublic()"),
        }
    }
}

fn write_combinator(f: &mut fmt::Formatter<'_>, name: &str, children: &[OperatorNode]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", child)?;
    }
    write!(f, ")")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree(dedicated: bool) -> OperatorNode {
        let b = IrBuilder;
        b.and(vec![
            b.author("@alice", dedicated),
            b.or(vec![
                b.message_type(Some("vote"), dedicated),
                b.message_type(Some("post"), dedicated),
            ]),
            b.is_public(),
        ])
    }

    #[test]
    fn test_builder_constructs_nodes() {
        let b = IrBuilder;
        assert_eq!(
            b.author("@alice", true),
            OperatorNode::AuthorPredicate {
                feed_id: "@alice".to_string(),
                dedicated: true,
            }
        );
        assert_eq!(b.is_private(), OperatorNode::IsPrivate);
        assert_eq!(b.or(vec![]), OperatorNode::Or { children: vec![] });
    }

    #[test]
    fn test_leaves_are_depth_first() {
        let tree = sample_tree(false);
        let leaves = tree.leaves();
        assert_eq!(leaves.len(), 4);
        assert_eq!(leaves[3], &OperatorNode::IsPublic);
    }

    #[test]
    fn test_dedicated_flags() {
        assert_eq!(sample_tree(true).dedicated_flags(), vec![true, true, true]);
        assert!(sample_tree(true).requires_dedicated_index());
        assert!(!sample_tree(false).requires_dedicated_index());
        assert!(!IrBuilder.is_private().requires_dedicated_index());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            sample_tree(true).to_string(),
            "and(author(@alice, dedicated), or(type(vote, dedicated), type(post, dedicated)), isPublic())"
        );
        assert_eq!(sample_tree(false).to_string(), "and(author(@alice), or(type(vote), type(post)), isPublic())");
    }

    #[test]
    fn test_serde_shape() {
        let node = IrBuilder.message_type(Some("vote"), false);
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(json, r#"{"TypePredicate":{"value":"vote","dedicated":false}}"#);

        let back: OperatorNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);

        let untyped = IrBuilder.message_type(None, false);
        let json = serde_json::to_string(&untyped).unwrap();
        assert_eq!(json, r#"{"TypePredicate":{"value":null,"dedicated":false}}"#);
    }

    #[test]
    fn test_untyped_predicate_display() {
        let node = IrBuilder.and(vec![
            IrBuilder.author("@alice", false),
            IrBuilder.message_type(None, false),
            IrBuilder.is_public(),
        ]);
        assert_eq!(node.to_string(), "and(author(@alice), type(null), isPublic())");
        assert_eq!(node.dedicated_flags(), vec![false, false]);
    }
}
