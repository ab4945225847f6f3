//! Resolving absolute positions into paths through the tree.
//!
//! An absolute position is a single integer; [`resolve`] turns it into a
//! [`Resolved`] view: the chain of ancestor containers enclosing that point,
//! with the child index and content start recorded at every depth. Depth 0
//! is always the document root; the deepest entry is the container whose
//! content directly holds the position.
//!
//! ```text
//! doc( body( para("ab") ) ),  pos = 3
//!
//! depth 0: doc,  index 0, content starts at 0
//! depth 1: body, index 0, content starts at 1
//! depth 2: para, index 0, content starts at 2
//! parent_offset = 1          (between 'a' and 'b')
//! ```
//!
//! `Resolved` borrows the tree and is recomputed on demand; it must never be
//! cached across edits, because positions shift under transactions.
//!
//! # Error Handling
//!
//! An out-of-range position is a programming error, not a recoverable
//! condition: [`resolve`] fails hard with
//! [`ResolveError::PositionOutOfRange`]. Every in-range position resolves.

use smallvec::SmallVec;
use thiserror::Error;

use crate::node::Node;

pub type Result<T> = std::result::Result<T, ResolveError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
  #[error("position {pos} out of range for document of size {size}")]
  PositionOutOfRange { pos: usize, size: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PathEntry<'a> {
  node:          &'a Node,
  index:         usize,
  content_start: usize,
}

/// An absolute position decomposed into its ancestor chain.
///
/// Read-only view borrowing the document tree. Accessors taking a depth `d`
/// expect `d <= depth()`; depth 0 is the root.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<'a> {
  pos:           usize,
  path:          SmallVec<[PathEntry<'a>; 4]>,
  parent_offset: usize,
}

impl<'a> Resolved<'a> {
  /// The absolute position this view was resolved from.
  pub fn pos(&self) -> usize {
    self.pos
  }

  /// Depth of the deepest enclosing container. 0 means the position sits
  /// directly in the root's content.
  pub fn depth(&self) -> usize {
    self.path.len() - 1
  }

  /// The ancestor node at depth `d`.
  pub fn node(&self, d: usize) -> &'a Node {
    self.path[d].node
  }

  /// Index within the depth-`d` node's content: for intermediate depths the
  /// index of the child descended into, at the deepest depth the index the
  /// position points at (or into).
  pub fn index(&self, d: usize) -> usize {
    self.path[d].index
  }

  /// Absolute position where the depth-`d` node's content begins.
  pub fn start(&self, d: usize) -> usize {
    self.path[d].content_start
  }

  /// Absolute position of the depth-`d` node's opening token. `None` at the
  /// root, which has no boundary tokens.
  pub fn before(&self, d: usize) -> Option<usize> {
    (d > 0).then(|| self.path[d].content_start - 1)
  }

  /// Absolute position of the depth-`d` node's closing token. `None` at the
  /// root.
  pub fn after(&self, d: usize) -> Option<usize> {
    self.before(d).map(|open| open + self.path[d].node.size())
  }

  /// The deepest enclosing container.
  pub fn parent(&self) -> &'a Node {
    self.path[self.path.len() - 1].node
  }

  /// Offset of the position within the deepest enclosing container's
  /// content.
  pub fn parent_offset(&self) -> usize {
    self.parent_offset
  }

  /// The child starting exactly at this position, if the position sits on a
  /// child boundary rather than inside text.
  pub fn node_after(&self) -> Option<&'a Node> {
    let (index, offset) = find_index(self.parent(), self.parent_offset);
    if offset == self.parent_offset {
      self.parent().child(index)
    } else {
      None
    }
  }
}

/// Resolve an absolute position against a document tree.
///
/// Descends from the root while the position falls strictly inside a
/// container child, recording the ancestor chain along the way. Positions
/// inside a text run stop at the text's parent container.
pub fn resolve(doc: &Node, pos: usize) -> Result<Resolved<'_>> {
  let size = doc.content_size();
  if pos > size {
    return Err(ResolveError::PositionOutOfRange { pos, size });
  }

  let mut path: SmallVec<[PathEntry; 4]> = SmallVec::new();
  let mut node = doc;
  let mut content_start = 0;
  let mut rel = pos;

  loop {
    let (index, offset) = find_index(node, rel);
    let rem = rel - offset;
    path.push(PathEntry {
      node,
      index,
      content_start,
    });

    if rem == 0 {
      break;
    }

    let Some(child) = node.child(index) else {
      // Position inside a childless node's text (degenerate text root).
      break;
    };
    if !child.is_container() {
      break;
    }

    node = child;
    content_start += offset + 1;
    rel = rem - 1;
  }

  let parent_offset = pos - path[path.len() - 1].content_start;
  Ok(Resolved {
    pos,
    path,
    parent_offset,
  })
}

/// Find the child a content-relative offset points at: returns the child
/// index and that child's start offset. An offset on a boundary yields the
/// child starting there; the content end yields `(child_count, offset)`.
fn find_index(node: &Node, rel: usize) -> (usize, usize) {
  let mut offset = 0;
  for (i, child) in node.children().iter().enumerate() {
    if rel == offset {
      return (i, offset);
    }
    let end = offset + child.size();
    if rel < end {
      return (i, offset);
    }
    offset = end;
  }
  (node.child_count(), offset)
}
