//! Structural filter expressions.
//!
//! A small boolean language for selecting nodes and pruning trees:
//!
//! ```text
//! name == "Alice"                       attribute equality
//! . != ""                               text value
//! : == "item" & lang = "en"             tag and attribute, both must hold
//! id == "1" | id == "2"                 either may hold
//! ```
//!
//! `&` binds tighter than `|`. An empty expression matches every node.
//! Comparisons that do not parse are dropped from their conjunction; an
//! unterminated quoted literal is an [`ExpressionError`].
//!
//! # Examples
//!
//! ```
//! use tagtree::{Filter, Node};
//!
//! let root = Node::new("person")
//!     .attr("name", "Ivan")
//!     .child(Node::new("person").attr("name", "Sergey"))
//!     .child(Node::new("person").attr("name", "Natasha"));
//!
//! let filter: Filter = r#"name = "Ivan" | name = "Sergey""#.parse().unwrap();
//! let pruned = root.select_tree(&filter).unwrap();
//! assert_eq!(pruned.child_count("person"), 1);
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::error::Error;
use crate::tree::Node;

pub use ast::{Comparison, Conjunction, Op, Selector};

/// Filter expression text could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at position {position}")]
pub struct ExpressionError {
    /// Human-readable error message.
    pub message: String,
    /// 0-based byte offset in the expression where the error occurred.
    pub position: usize,
}

impl ExpressionError {
    pub(crate) fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// A parsed filter expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Filter {
    /// Matches every node. Produced by an empty expression.
    #[default]
    Any,
    /// Matches when any conjunction matches.
    Disjunction(Vec<Conjunction>),
}

impl Filter {
    /// The filter that matches every node.
    #[must_use]
    pub fn any() -> Self {
        Self::Any
    }

    /// Parses expression text.
    ///
    /// # Errors
    ///
    /// Returns [`ExpressionError`] if a quoted literal is not terminated.
    pub fn parse(text: &str) -> Result<Self, ExpressionError> {
        parser::parse(text)
    }

    /// Whether this is the universal filter.
    #[must_use]
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Evaluates the filter against a single node (children are not
    /// considered).
    pub fn matches(&self, node: &Node) -> bool {
        match self {
            Self::Any => true,
            Self::Disjunction(conjunctions) => conjunctions.iter().any(|c| c.matches(node)),
        }
    }
}

impl FromStr for Filter {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self::Disjunction(conjunctions) = self else {
            return Ok(());
        };
        for (i, conjunction) in conjunctions.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{conjunction}")?;
        }
        Ok(())
    }
}

/// Anything that can decide whether a single node is selected.
///
/// Implemented by [`Filter`] and by closures taking `&Node`.
pub trait NodePredicate {
    /// Returns true if `node` is selected.
    fn test(&self, node: &Node) -> bool;
}

impl NodePredicate for Filter {
    fn test(&self, node: &Node) -> bool {
        self.matches(node)
    }
}

impl<F> NodePredicate for F
where
    F: Fn(&Node) -> bool,
{
    fn test(&self, node: &Node) -> bool {
        self(node)
    }
}

impl Node {
    /// Evaluates a predicate against this node only.
    pub fn satisfies<P: NodePredicate + ?Sized>(&self, predicate: &P) -> bool {
        predicate.test(self)
    }

    /// Returns a pruned copy of this tree.
    ///
    /// If this node fails the predicate the result is `None`, whatever its
    /// descendants look like. Otherwise the result carries this node's tag,
    /// value and attributes, plus every child whose own pruning was not
    /// `None`. The result shares nothing with `self`.
    pub fn select_tree<P: NodePredicate + ?Sized>(&self, predicate: &P) -> Option<Node> {
        if !predicate.test(self) {
            return None;
        }
        let mut copy = self.shallow_copy();
        for child in self.all_children() {
            if let Some(kept) = child.select_tree(predicate) {
                copy.add_child(kept);
            }
        }
        Some(copy)
    }

    /// Parses `expression` and evaluates it against this node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExpression`] if the expression does not parse.
    pub fn satisfies_expr(&self, expression: &str) -> Result<bool, Error> {
        Ok(self.satisfies(&Filter::parse(expression)?))
    }

    /// Parses `expression` and prunes this tree with it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExpression`] if the expression does not parse.
    pub fn select_tree_expr(&self, expression: &str) -> Result<Option<Node>, Error> {
        Ok(self.select_tree(&Filter::parse(expression)?))
    }
}
