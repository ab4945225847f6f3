//! The document tree: typed, immutable nodes addressed by integer offsets.
//!
//! A document is a tree of [`Node`]s. Every node has a `kind` (a type name
//! drawn from an external registry), an attribute map, optional inline marks,
//! and a [`Content`] variant that determines both its children and its width
//! in the flattened coordinate space:
//!
//! - **Text** — a run of characters, width = character count
//! - **Leaf** — an atomic node with no interior, width 1
//! - **Container** — an ordered child sequence, width 2 + children
//!   (one token each for the open and close boundaries)
//!
//! ```text
//! doc( body( para("ab"), rule ) )
//!
//! 0 body 1 para 2 'a' 3 'b' 4 /para 5 rule 6 /body 7
//! ```
//!
//! A position strictly between a container's open and close tokens is
//! "inside" that container. The root is special: positions address the
//! root's *content*, so the root's own boundary tokens do not count and
//! valid positions are `0..=doc.content_size()`.
//!
//! Nodes are plain values: cloning a node clones its subtree, and edits
//! build new trees rather than mutating in place. Traversal state (ancestor
//! chain, child index) is threaded explicitly by the resolver; nodes carry
//! no parent back-pointers.
//!
//! Whether a node's structure conforms to the registry's content-model rules
//! is assumed, never enforced here.

use serde::{
  Deserialize,
  Serialize,
};

use crate::Tendril;

/// Key→value attribute mapping. Attribute values are JSON-shaped.
pub type Attrs = serde_json::Map<String, serde_json::Value>;

/// An inline mark carried by a node. Marks are data only: this core stores
/// and compares them but never interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
  pub name:  Tendril,
  pub attrs: Attrs,
}

impl Mark {
  pub fn new(name: impl Into<Tendril>) -> Self {
    Self {
      name:  name.into(),
      attrs: Attrs::new(),
    }
  }
}

/// What a node holds, and thereby how wide it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Content {
  /// A run of text. Width = character count.
  Text(Tendril),

  /// An atomic node with no interior. Width 1.
  Leaf,

  /// An ordered sequence of children. Width 2 + children.
  Container(Vec<Node>),
}

/// A typed, immutable document tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
  pub kind:    Tendril,
  pub attrs:   Attrs,
  pub marks:   Vec<Mark>,
  pub content: Content,
}

impl Node {
  pub fn container(kind: impl Into<Tendril>, children: Vec<Node>) -> Self {
    Self {
      kind:    kind.into(),
      attrs:   Attrs::new(),
      marks:   Vec::new(),
      content: Content::Container(children),
    }
  }

  pub fn leaf(kind: impl Into<Tendril>) -> Self {
    Self {
      kind:    kind.into(),
      attrs:   Attrs::new(),
      marks:   Vec::new(),
      content: Content::Leaf,
    }
  }

  pub fn text(text: impl Into<Tendril>) -> Self {
    Self {
      kind:    "text".into(),
      attrs:   Attrs::new(),
      marks:   Vec::new(),
      content: Content::Text(text.into()),
    }
  }

  #[must_use]
  pub fn with_attrs(mut self, attrs: Attrs) -> Self {
    self.attrs = attrs;
    self
  }

  #[must_use]
  pub fn with_marks(mut self, marks: Vec<Mark>) -> Self {
    self.marks = marks;
    self
  }

  /// Rebuild this node with different children, keeping kind, attrs and
  /// marks. Used when rebuilding the ancestor spine after an edit.
  #[must_use]
  pub fn with_children(&self, children: Vec<Node>) -> Self {
    Self {
      kind:    self.kind.clone(),
      attrs:   self.attrs.clone(),
      marks:   self.marks.clone(),
      content: Content::Container(children),
    }
  }

  pub fn is_text(&self) -> bool {
    matches!(self.content, Content::Text(_))
  }

  /// The text run of a text node.
  pub fn as_text(&self) -> Option<&str> {
    match &self.content {
      Content::Text(text) => Some(text),
      Content::Leaf | Content::Container(_) => None,
    }
  }

  /// Rebuild this text node with a different run of characters, keeping
  /// kind, attrs and marks. Used when an edit splits a text node.
  #[must_use]
  pub fn with_text(&self, text: Tendril) -> Self {
    Self {
      kind:    self.kind.clone(),
      attrs:   self.attrs.clone(),
      marks:   self.marks.clone(),
      content: Content::Text(text),
    }
  }

  pub fn is_container(&self) -> bool {
    matches!(self.content, Content::Container(_))
  }

  /// Token width of this node in the flattened coordinate space.
  pub fn size(&self) -> usize {
    match &self.content {
      Content::Text(text) => text.chars().count(),
      Content::Leaf => 1,
      Content::Container(children) => 2 + children.iter().map(Node::size).sum::<usize>(),
    }
  }

  /// Width of this node's content, without its own boundary tokens.
  ///
  /// For the document root this is the valid position range: absolute
  /// positions run over `0..=content_size`.
  pub fn content_size(&self) -> usize {
    match &self.content {
      Content::Text(text) => text.chars().count(),
      Content::Leaf => 0,
      Content::Container(children) => children.iter().map(Node::size).sum(),
    }
  }

  pub fn child_count(&self) -> usize {
    self.children().len()
  }

  pub fn child(&self, index: usize) -> Option<&Node> {
    self.children().get(index)
  }

  /// Children of this node. Empty for text and leaf nodes.
  pub fn children(&self) -> &[Node] {
    match &self.content {
      Content::Container(children) => children,
      Content::Text(_) | Content::Leaf => &[],
    }
  }

  /// Pre-order walk over every descendant of this node.
  ///
  /// The callback receives each node together with the offset of its opening
  /// token relative to the start of `self`'s content, in document order.
  /// Returning `false` prunes descent into that node; siblings are still
  /// visited.
  pub fn descendants<'a>(&'a self, f: &mut impl FnMut(&'a Node, usize) -> bool) {
    self.walk(0, f);
  }

  fn walk<'a>(&'a self, base: usize, f: &mut impl FnMut(&'a Node, usize) -> bool) {
    let mut pos = base;
    for child in self.children() {
      let descend = f(child, pos);
      if descend && child.is_container() {
        child.walk(pos + 1, f);
      }
      pos += child.size();
    }
  }

  /// Whether this node has the given kind and matches every supplied
  /// attribute. Only the supplied keys are compared; extra attributes on the
  /// node are ignored.
  pub fn has_markup(&self, kind: &str, attrs: &Attrs) -> bool {
    self.kind == kind && attrs.iter().all(|(key, value)| self.attrs.get(key) == Some(value))
  }
}

/// A node paired with the absolute position of its opening token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeRef<'a> {
  pub node: &'a Node,
  pub pos:  usize,
}

impl<'a> NodeRef<'a> {
  pub fn new(node: &'a Node, pos: usize) -> Self {
    Self { node, pos }
  }

  /// Absolute position where this node's content begins.
  pub fn content_start(&self) -> usize {
    self.pos + 1
  }

  /// Absolute position of this node's closing token.
  pub fn end(&self) -> usize {
    self.pos + self.node.size()
  }
}
