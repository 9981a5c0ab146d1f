//! Markup serialization.
//!
//! Walks a [`Node`](crate::Node) tree and writes it back out as markup text
//! that the ingestor reads back into an equal tree. See [`xml`] for the
//! output rules.

pub mod xml;

pub use xml::{serialize, serialize_with_options, write_to, SerializeOptions};
