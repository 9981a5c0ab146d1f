//! Typed materialization of generic trees.
//!
//! A [`Registry`] maps tags to factory closures that build a caller-chosen
//! domain type `T`. [`materialize`] walks a [`Node`] tree bottom-up: every
//! child is materialized first, then the factory for the node's own tag is
//! handed a [`Draft`] holding the node's tag, value, attributes and the
//! already-materialized children. What happens to a node with no factory, or
//! whose factory fails, is decided by the [`Policy`]. A kept node is the
//! draft itself, so typed descendants survive under an untyped parent.
//!
//! # Examples
//!
//! ```
//! use tagtree::materialize::{materialize, Materialized, Policy, Registry};
//! use tagtree::Node;
//!
//! #[derive(Debug, PartialEq)]
//! enum Pet {
//!     Dog(String),
//!     Kennel(usize),
//! }
//!
//! let mut registry = Registry::new();
//! registry.register("dog", |draft| {
//!     Ok::<_, String>(Pet::Dog(draft.attribute("name").unwrap_or("?").to_string()))
//! });
//! registry.register("kennel", |draft| Ok::<_, String>(Pet::Kennel(draft.child_count())));
//!
//! let tree = Node::new("kennel")
//!     .child(Node::new("dog").attr("name", "Rex"))
//!     .child(Node::new("cat").attr("name", "Tom"));
//!
//! let kennel = materialize(&tree, &registry, Policy::SkipOnError).unwrap().unwrap();
//! assert_eq!(kennel.into_typed(), Some(Pet::Kennel(1)));
//! ```

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;

use crate::error::{BoxError, Error};
use crate::tree::Node;

/// What to do with a node that has no factory or whose factory fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// Abort the whole materialization with an error naming the tag.
    #[default]
    ThrowOnError,
    /// Keep the node's own fields and its materialized children as
    /// [`Materialized::Generic`].
    KeepOnError,
    /// Drop the node from its parent; a failing root yields `None`.
    SkipOnError,
}

/// The result of materializing one node.
#[derive(Debug, Clone, PartialEq)]
pub enum Materialized<T> {
    /// A factory built a domain value.
    Typed(T),
    /// The node was kept under [`Policy::KeepOnError`]. Its children are
    /// still materialized.
    Generic(Draft<T>),
}

impl<T> Materialized<T> {
    /// Returns `true` for [`Materialized::Typed`].
    pub fn is_typed(&self) -> bool {
        matches!(self, Self::Typed(_))
    }

    /// The domain value, if one was built.
    pub fn as_typed(&self) -> Option<&T> {
        match self {
            Self::Typed(value) => Some(value),
            Self::Generic(_) => None,
        }
    }

    /// Consumes `self`, returning the domain value if one was built.
    pub fn into_typed(self) -> Option<T> {
        match self {
            Self::Typed(value) => Some(value),
            Self::Generic(_) => None,
        }
    }

    /// The retained node, if it was kept as generic.
    pub fn as_generic(&self) -> Option<&Draft<T>> {
        match self {
            Self::Typed(_) => None,
            Self::Generic(node) => Some(node),
        }
    }
}

/// A node on its way to becoming a `T`: its own tag, value and attributes,
/// plus its children already materialized and grouped by tag in source
/// order.
///
/// Factories get the draft by mutable reference. Under
/// [`Policy::KeepOnError`] a draft whose factory failed becomes the kept
/// node, minus any children the factory had already taken out.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft<T> {
    tag: Option<String>,
    value: Option<String>,
    attributes: IndexMap<String, String>,
    children: IndexMap<String, Vec<Materialized<T>>>,
}

impl<T> Draft<T> {
    /// The node's tag.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// The node's text value.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Looks up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Iterates over attributes in insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The materialized children with the given tag.
    pub fn children_of(&self, tag: &str) -> &[Materialized<T>] {
        self.children.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The typed children with the given tag, skipping any kept as generic
    /// nodes.
    pub fn typed_children_of<'a>(&'a self, tag: &str) -> impl Iterator<Item = &'a T> + 'a {
        self.children_of(tag).iter().filter_map(Materialized::as_typed)
    }

    /// Moves the children with the given tag out of the draft.
    pub fn take_children_of(&mut self, tag: &str) -> Vec<Materialized<T>> {
        self.children.shift_remove(tag).unwrap_or_default()
    }

    /// Moves the typed children with the given tag out of the draft,
    /// discarding generic ones.
    pub fn take_typed_children_of(&mut self, tag: &str) -> Vec<T> {
        self.take_children_of(tag)
            .into_iter()
            .filter_map(Materialized::into_typed)
            .collect()
    }

    /// Iterates over every child, group by group.
    pub fn all_children(&self) -> impl Iterator<Item = &Materialized<T>> {
        self.children.values().flatten()
    }

    /// Total number of children that survived materialization.
    pub fn child_count(&self) -> usize {
        self.children.values().map(Vec::len).sum()
    }
}

type Factory<T> = Box<dyn Fn(&mut Draft<T>) -> Result<T, BoxError>>;

/// Tag to factory mapping, supplied by the caller.
///
/// Factories are looked up by the node's tag, or by `"<namespace>.<tag>"`
/// once [`with_namespace`](Registry::with_namespace) is set.
pub struct Registry<T> {
    factories: HashMap<String, Factory<T>>,
    namespace: Option<String>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            factories: HashMap::new(),
            namespace: None,
        }
    }
}

impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("Registry")
            .field("namespace", &self.namespace)
            .field("factories", &keys)
            .finish()
    }
}

impl<T> Registry<T> {
    /// An empty registry without a namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches lookup to `"<namespace>.<tag>"` keys.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Registers a factory under `key`, replacing any earlier one.
    ///
    /// With a namespace set, `key` is the full `"<namespace>.<tag>"` name.
    pub fn register<F, E>(&mut self, key: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&mut Draft<T>) -> Result<T, E> + 'static,
        E: Into<BoxError>,
    {
        self.factories.insert(
            key.into(),
            Box::new(move |draft: &mut Draft<T>| factory(draft).map_err(Into::into)),
        );
        self
    }

    /// Whether a factory would be found for a node with this tag.
    pub fn contains(&self, tag: &str) -> bool {
        self.lookup(tag).is_some()
    }

    /// Number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no factory is registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    fn lookup(&self, tag: &str) -> Option<&Factory<T>> {
        match &self.namespace {
            Some(ns) => self.factories.get(&format!("{ns}.{tag}")),
            None => self.factories.get(tag),
        }
    }
}

/// Materializes `node` and its descendants.
///
/// Returns `Ok(None)` only under [`Policy::SkipOnError`] when the root
/// itself has no factory or its factory fails.
///
/// # Errors
///
/// Under [`Policy::ThrowOnError`], returns [`Error::UnknownTag`] for the
/// first node without a factory and [`Error::Factory`] for the first factory
/// failure, both naming the offending tag.
pub fn materialize<T>(
    node: &Node,
    registry: &Registry<T>,
    policy: Policy,
) -> Result<Option<Materialized<T>>, Error> {
    let mut children: IndexMap<String, Vec<Materialized<T>>> = IndexMap::new();
    for (group, members) in node.groups() {
        for child in members {
            if let Some(done) = materialize(child, registry, policy)? {
                children.entry(group.to_string()).or_default().push(done);
            }
        }
    }

    let mut draft = Draft {
        tag: node.tag().map(str::to_string),
        value: node.value().map(str::to_string),
        attributes: node
            .attributes()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        children,
    };

    let tag = node.tag().unwrap_or_default();
    let Some(factory) = registry.lookup(tag) else {
        return recover(draft, policy, Error::UnknownTag {
            tag: tag.to_string(),
        });
    };
    match factory(&mut draft) {
        Ok(value) => Ok(Some(Materialized::Typed(value))),
        Err(source) => recover(draft, policy, Error::Factory {
            tag: tag.to_string(),
            source,
        }),
    }
}

fn recover<T>(
    draft: Draft<T>,
    policy: Policy,
    error: Error,
) -> Result<Option<Materialized<T>>, Error> {
    match policy {
        Policy::ThrowOnError => Err(error),
        Policy::KeepOnError => {
            tracing::debug!(%error, "keeping node as generic");
            Ok(Some(Materialized::Generic(draft)))
        }
        Policy::SkipOnError => {
            tracing::debug!(%error, "skipping node");
            Ok(None)
        }
    }
}
