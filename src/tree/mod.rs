//! Attributed tree document model.
//!
//! A [`Node`] carries an optional tag, an optional text value, a map of named
//! attributes, and its children grouped by tag. The tree is an owned tree of
//! owned nodes: a node exclusively owns its attributes and children and never
//! knows its parent, so there are no back-references and no cycles.
//!
//! # Child groups
//!
//! Children live in a map from tag to an ordered `Vec<Node>`. Within a group
//! insertion order is significant. Across groups it is not part of node
//! identity (equality ignores it), but it is still the order in which
//! [`Node::all_children`] and the serializer visit the groups.
//!
//! # Examples
//!
//! ```
//! use tagtree::Node;
//!
//! let mut root = Node::with_value("person", "Very Important Person Indeed")
//!     .attr("id", "V-AK 610742")
//!     .attr("name", "Ivan Ivanov");
//! root.add_child(Node::with_value("person", "Precious child").attr("name", "Natasha Ivanova"));
//!
//! assert_eq!(root.child_count("person"), 1);
//! assert_eq!(root.first_child_value_of("person"), Some("Precious child"));
//! assert_eq!(root.attribute_or("missing", "n/a"), "n/a");
//! ```

use indexmap::IndexMap;

/// Group key used for children that were never given a tag.
const UNTAGGED: &str = "";

/// One element of the attributed tree.
///
/// `Clone` is a deep copy: the clone gets its own attribute map and its own
/// recursively copied children, never aliasing the original. `PartialEq` is
/// structural equality: tags, values, attribute sets, and child groups are
/// compared, with attribute order and the order between groups ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    tag: Option<String>,
    value: Option<String>,
    attributes: IndexMap<String, String>,
    children: IndexMap<String, Vec<Node>>,
}

impl Node {
    // -- Construction --------------------------------------------------------

    /// Creates a node with the given tag and nothing else.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    /// Creates a node with a tag and a text value.
    pub fn with_value(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Creates a fully specified node.
    pub fn with_parts<K, V>(
        tag: impl Into<String>,
        value: Option<String>,
        attributes: impl IntoIterator<Item = (K, V)>,
        children: impl IntoIterator<Item = Node>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut node = Self {
            tag: Some(tag.into()),
            value,
            ..Self::default()
        };
        node.set_attributes(attributes);
        node.add_children(children);
        node
    }

    /// Assigns a tag to this node, replacing any existing one.
    ///
    /// Takes the node by value so a node that already sits in a parent's
    /// group can never be re-tagged behind that group's back.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Builder form of [`set_attribute`](Self::set_attribute).
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder form of [`add_child`](Self::add_child).
    #[must_use]
    pub fn child(mut self, child: Node) -> Self {
        self.add_child(child);
        self
    }

    /// Builder form of [`set_value`](Self::set_value).
    #[must_use]
    pub fn text(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    // -- Tag and value -------------------------------------------------------

    /// The element name, absent only for a default-constructed node.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// The text content. Absent is distinct from the empty string.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Sets the text content, returning the node for chaining.
    pub fn set_value(&mut self, value: impl Into<String>) -> &mut Self {
        self.value = Some(value.into());
        self
    }

    /// Removes the text content, returning the node for chaining.
    pub fn clear_value(&mut self) -> &mut Self {
        self.value = None;
        self
    }

    // -- Attributes ----------------------------------------------------------

    /// Returns the value of the named attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns the value of the named attribute, or `default` if unset.
    pub fn attribute_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.attribute(name).unwrap_or(default)
    }

    /// Returns `true` if the named attribute is set.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Sets an attribute, replacing any previous value under the same name.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Sets every `(name, value)` pair in order.
    pub fn set_attributes<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in pairs {
            self.attributes.insert(name.into(), value.into());
        }
        self
    }

    /// Sets attributes from a flat `name, value, name, value, ...` sequence.
    ///
    /// A trailing name without a value is ignored.
    pub fn set_attributes_flat<S: AsRef<str>>(&mut self, flat: &[S]) -> &mut Self {
        for pair in flat.chunks_exact(2) {
            self.attributes
                .insert(pair[0].as_ref().to_string(), pair[1].as_ref().to_string());
        }
        self
    }

    /// Removes an attribute, returning its previous value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(name)
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of attributes set on this node.
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    // -- Child lookup --------------------------------------------------------

    /// Children in the given tag's group, in insertion order. Empty if the tag
    /// was never seen.
    pub fn children_of(&self, tag: &str) -> &[Node] {
        self.children.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Mutable access to the given tag's group.
    pub fn children_of_mut(&mut self, tag: &str) -> &mut [Node] {
        match self.children.get_mut(tag) {
            Some(group) => group.as_mut_slice(),
            None => &mut [],
        }
    }

    /// Number of children in the given tag's group.
    pub fn child_count(&self, tag: &str) -> usize {
        self.children_of(tag).len()
    }

    /// First child in the given tag's group.
    pub fn first_child_of(&self, tag: &str) -> Option<&Node> {
        self.children_of(tag).first()
    }

    /// Mutable access to the first child in the given tag's group.
    pub fn first_child_of_mut(&mut self, tag: &str) -> Option<&mut Node> {
        self.children_of_mut(tag).first_mut()
    }

    /// Value of the first child in the given tag's group.
    pub fn first_child_value_of(&self, tag: &str) -> Option<&str> {
        self.first_child_of(tag).and_then(Node::value)
    }

    /// First child of the given tag whose attribute `name` equals `value`.
    pub fn find_child(&self, tag: &str, name: &str, value: &str) -> Option<&Node> {
        self.children_of(tag)
            .iter()
            .find(|child| child.attribute(name) == Some(value))
    }

    /// Shorthand for `find_child(tag, "id", id)`.
    pub fn find_child_by_id(&self, tag: &str, id: &str) -> Option<&Node> {
        self.find_child(tag, "id", id)
    }

    /// Every child: group by group in group order, then in-group order.
    pub fn all_children(&self) -> impl Iterator<Item = &Node> {
        self.children.values().flatten()
    }

    /// Iterates over `(tag, group)` pairs in group order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[Node])> {
        self.children
            .iter()
            .map(|(tag, group)| (tag.as_str(), group.as_slice()))
    }

    /// Returns `true` if the node has at least one child.
    pub fn has_children(&self) -> bool {
        self.children.values().any(|group| !group.is_empty())
    }

    /// Returns `true` if the node has no value, no attributes, and no children.
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.attributes.is_empty() && !self.has_children()
    }

    /// Number of nodes below this one.
    pub fn descendant_count(&self) -> usize {
        self.all_children()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }

    // -- Child mutation ------------------------------------------------------

    /// Appends a child to the group matching its tag, creating the group if
    /// needed, and returns a handle to the stored child.
    ///
    /// Passing `None` is a no-op that returns `None`. The child is moved into
    /// this node; use [`deep_copy`](Self::deep_copy) first to keep an
    /// independent copy.
    pub fn add_child(&mut self, child: impl Into<Option<Node>>) -> Option<&mut Node> {
        let child = child.into()?;
        let group = self
            .children
            .entry(child.group_key().to_string())
            .or_default();
        group.push(child);
        group.last_mut()
    }

    /// Adds every element that is actually a node, silently skipping `None`.
    pub fn add_children<I>(&mut self, children: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Option<Node>>,
    {
        for child in children {
            self.add_child(child);
        }
        self
    }

    /// Removes the last child in `child`'s tag group that is structurally
    /// equal to it, returning the removed node.
    ///
    /// Equal twins are interchangeable, so taking the most recent one means
    /// adding and then removing a child restores the group's prior sequence.
    /// A group left empty is dropped.
    pub fn remove_child(&mut self, child: &Node) -> Option<Node> {
        let key = child.group_key();
        let group = self.children.get_mut(key)?;
        let index = group.iter().rposition(|candidate| candidate == child)?;
        let removed = group.remove(index);
        if group.is_empty() {
            self.children.shift_remove(key);
        }
        Some(removed)
    }

    /// Removes the whole group for `tag`, returning its children. An unknown
    /// tag yields an empty vector.
    pub fn remove_children_of(&mut self, tag: &str) -> Vec<Node> {
        self.children.shift_remove(tag).unwrap_or_default()
    }

    // -- Copy and comparison -------------------------------------------------

    /// Returns an independent deep copy of this node and its subtree.
    #[must_use]
    pub fn deep_copy(&self) -> Node {
        self.clone()
    }

    /// Structural equality, ignoring attribute order and the order between
    /// child groups.
    pub fn structural_equals(&self, other: &Node) -> bool {
        self == other
    }

    /// Copies tag, value, and attributes, leaving the children behind.
    pub(crate) fn shallow_copy(&self) -> Node {
        Node {
            tag: self.tag.clone(),
            value: self.value.clone(),
            attributes: self.attributes.clone(),
            children: IndexMap::new(),
        }
    }

    fn group_key(&self) -> &str {
        self.tag.as_deref().unwrap_or(UNTAGGED)
    }
}
