//! Filter expression syntax tree.
//!
//! A parsed expression is a disjunction of [`Conjunction`]s, each a list of
//! [`Comparison`]s. Every type here knows how to evaluate itself against a
//! [`Node`] and how to print itself back in canonical text form.

use std::fmt;

use crate::tree::Node;

/// What part of a node a comparison looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `.` -- the node's text value.
    Value,
    /// `:` -- the node's tag.
    Tag,
    /// An attribute looked up by name.
    Attribute(String),
}

impl Selector {
    /// Picks the selected string out of `node`, or `None` when the node has
    /// no such value, tag, or attribute.
    pub fn select<'n>(&self, node: &'n Node) -> Option<&'n str> {
        match self {
            Self::Value => node.value(),
            Self::Tag => node.tag(),
            Self::Attribute(name) => node.attribute(name),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => f.write_str("."),
            Self::Tag => f.write_str(":"),
            Self::Attribute(name) => f.write_str(name),
        }
    }
}

/// Comparison operator. `=` and `==` both parse to [`Op::Eq`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `==` or `=`
    Eq,
    /// `!=`
    Ne,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eq => "==",
            Self::Ne => "!=",
        })
    }
}

/// `selector op "literal"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    /// The left-hand side.
    pub selector: Selector,
    /// The operator.
    pub op: Op,
    /// The unescaped literal on the right-hand side.
    pub literal: String,
}

impl Comparison {
    /// Evaluates the comparison. A missing selection never equals a literal.
    pub fn matches(&self, node: &Node) -> bool {
        let equal = self.selector.select(node) == Some(self.literal.as_str());
        match self.op {
            Op::Eq => equal,
            Op::Ne => !equal,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} \"", self.selector, self.op)?;
        for ch in self.literal.chars() {
            if matches!(ch, '"' | '\\') {
                f.write_str("\\")?;
            }
            write!(f, "{ch}")?;
        }
        f.write_str("\"")
    }
}

/// Comparisons joined by `&`. An empty conjunction is true.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conjunction {
    /// The comparisons, all of which must hold.
    pub comparisons: Vec<Comparison>,
}

impl Conjunction {
    /// True when every comparison matches `node`.
    pub fn matches(&self, node: &Node) -> bool {
        self.comparisons.iter().all(|c| c.matches(node))
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, comparison) in self.comparisons.iter().enumerate() {
            if i > 0 {
                f.write_str(" & ")?;
            }
            write!(f, "{comparison}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cmp(selector: Selector, op: Op, literal: &str) -> Comparison {
        Comparison {
            selector,
            op,
            literal: literal.to_string(),
        }
    }

    #[test]
    fn test_selectors() {
        let node = Node::with_value("item", "text").attr("id", "7");
        assert_eq!(Selector::Value.select(&node), Some("text"));
        assert_eq!(Selector::Tag.select(&node), Some("item"));
        assert_eq!(Selector::Attribute("id".into()).select(&node), Some("7"));
        assert_eq!(Selector::Attribute("nope".into()).select(&node), None);
    }

    #[test]
    fn test_missing_attribute_never_equals() {
        let node = Node::new("item");
        let eq = cmp(Selector::Attribute("id".into()), Op::Eq, "");
        let ne = cmp(Selector::Attribute("id".into()), Op::Ne, "");
        assert!(!eq.matches(&node));
        assert!(ne.matches(&node));
    }

    #[test]
    fn test_empty_conjunction_is_true() {
        assert!(Conjunction::default().matches(&Node::new("x")));
    }

    #[test]
    fn test_display_escapes_literal() {
        let c = cmp(Selector::Value, Op::Ne, "say \"hi\" \\o/");
        assert_eq!(c.to_string(), r#". != "say \"hi\" \\o/""#);
    }
}
