//! The two selection shapes over a document snapshot.
//!
//! A [`Selection`] is a tagged variant, matched exhaustively everywhere it
//! is consumed:
//!
//! - **Range** — anchor + head absolute positions, order-independent. The
//!   head is where the cursor sits; the anchor is the other end. When
//!   `anchor == head` the range is a collapsed cursor.
//! - **Node** — a single position whose immediately following node is
//!   considered wholly selected.
//!
//! Selections are owned by the snapshot and replaced wholesale on each
//! edit, never mutated in place.
//!
//! # Error Handling
//!
//! [`Selection::node_at`] and [`Selection::to`] validate against the tree:
//! a node selection position with no node starting there is
//! [`SelectionError::NoNodeAt`]. Lookups that merely *read* a selection
//! treat invalid positions as absence instead.

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;
use vellum_core::{
  node::{
    Node,
    NodeRef,
  },
  resolve::{
    self,
    ResolveError,
  },
};

pub type Result<T> = std::result::Result<T, SelectionError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
  #[error("no node starts at position {pos}")]
  NoNodeAt { pos: usize },
  #[error(transparent)]
  Resolve(#[from] ResolveError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
  /// Anchor + head span. `anchor <= head` is not required.
  Range { anchor: usize, head: usize },

  /// The node starting at `at` is wholly selected.
  Node { at: usize },
}

impl Selection {
  /// A collapsed cursor.
  pub fn point(pos: usize) -> Self {
    Selection::Range {
      anchor: pos,
      head:   pos,
    }
  }

  pub fn range(anchor: usize, head: usize) -> Self {
    Selection::Range { anchor, head }
  }

  /// Construct a node selection, verifying that a node actually starts at
  /// `pos` in `doc`.
  pub fn node_at(doc: &Node, pos: usize) -> Result<Self> {
    let resolved = resolve::resolve(doc, pos)?;
    if resolved.node_after().is_none() {
      return Err(SelectionError::NoNodeAt { pos });
    }
    Ok(Selection::Node { at: pos })
  }

  /// The cursor end of the selection.
  pub fn head(&self) -> usize {
    match *self {
      Selection::Range { head, .. } => head,
      Selection::Node { at } => at,
    }
  }

  /// Lower bound of the selected span.
  pub fn from(&self) -> usize {
    match *self {
      Selection::Range { anchor, head } => anchor.min(head),
      Selection::Node { at } => at,
    }
  }

  /// Upper bound of the selected span. A node selection needs the tree to
  /// measure the selected node.
  pub fn to(&self, doc: &Node) -> Result<usize> {
    match *self {
      Selection::Range { anchor, head } => Ok(anchor.max(head)),
      Selection::Node { at } => {
        let resolved = resolve::resolve(doc, at)?;
        let node = resolved
          .node_after()
          .ok_or(SelectionError::NoNodeAt { pos: at })?;
        Ok(at + node.size())
      },
    }
  }

  /// The wholly selected node of a node selection, or `None` for ranges.
  /// An invalid position is reported as absence here; this is a read, not a
  /// construction.
  pub fn selected_node<'a>(&self, doc: &'a Node) -> Option<NodeRef<'a>> {
    match *self {
      Selection::Node { at } => {
        let resolved = resolve::resolve(doc, at).ok()?;
        resolved.node_after().map(|node| NodeRef::new(node, at))
      },
      Selection::Range { .. } => None,
    }
  }
}
