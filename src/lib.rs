//! # tagtree
//!
//! An attributed tree model for markup-like data: each [`Node`] has an
//! optional tag, an optional text value, named attributes, and children
//! grouped by tag. On top of the tree sit an ingestor that builds trees from
//! markup, a serializer that writes them back, a small filter language for
//! pruning trees, and a registry-driven materializer that turns trees into
//! caller-defined types.
//!
//! ## Quick Start
//!
//! ```
//! use tagtree::Node;
//!
//! let root = Node::parse_str(r#"<feed><item id="1">One</item><item id="2">Two</item></feed>"#).unwrap();
//! assert_eq!(root.child_count("item"), 2);
//!
//! let pruned = root.select_tree_expr(r#": == "feed" | id == "2""#).unwrap().unwrap();
//! assert_eq!(pruned.first_child_value_of("item"), Some("Two"));
//!
//! let xml = tagtree::serialize(&pruned);
//! assert!(xml.ends_with("<feed><item id=\"2\">Two</item></feed>\n"));
//! ```

pub mod encoding;
pub mod error;
pub mod filter;
pub mod materialize;
pub mod parser;
pub mod sax;
pub mod serial;
pub mod tree;

// Re-export primary types at the crate root for convenience.
pub use error::{Error, ParseError, Result};
pub use filter::{Filter, NodePredicate};
pub use materialize::{materialize, Draft, Materialized, Policy, Registry};
pub use parser::{parse_bytes, parse_reader, parse_str, parse_str_with_options, ParseOptions};
pub use serial::{serialize, serialize_with_options, write_to, SerializeOptions};
pub use tree::Node;
