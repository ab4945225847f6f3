//! Edit descriptions and position maps.
//!
//! A [`Transaction`] describes the derivation of a new document tree from a
//! snapshot: an ordered sequence of structural [`Step`]s, a working copy of
//! the tree with those steps applied, and a [`Mapping`] that translates
//! pre-edit absolute positions into post-edit ones. The source snapshot is
//! never touched; the transaction owns its copy and hands it over when a
//! dispatch sink commits it.
//!
//! # Position Mapping
//!
//! Every step contributes a [`StepMap`], a pure function from old offset to
//! new offset. [`Assoc`] controls which side of an insertion or deletion
//! boundary a mapped position prefers:
//!
//! - **Before** — stay before content inserted at this position
//! - **After** — move past it
//!
//! ```ignore
//! // Replace [4, 6) with a node of width 3.
//! let map = StepMap::new(4, 6, 3, 10);
//!
//! assert_eq!(map.map(2, Assoc::Before).unwrap(), 2); // untouched prefix
//! assert_eq!(map.map(4, Assoc::Before).unwrap(), 4); // before the insertion
//! assert_eq!(map.map(6, Assoc::After).unwrap(), 7);  // after it
//! assert_eq!(map.map(8, Assoc::Before).unwrap(), 9); // shifted suffix
//! ```
//!
//! A [`Mapping`] folds a position through the step maps in order, so a
//! position valid in the snapshot is valid against the transaction's
//! resulting tree.
//!
//! # Replacement Granularity
//!
//! [`Transaction::replace`] splices children of the deepest container
//! enclosing both endpoints. An endpoint inside a text child splits that
//! text exactly at the offset; an endpoint descending into a nested
//! container widens outward to that child's boundary, so partially covered
//! blocks are replaced whole. The recorded step and its map always use the
//! effective bounds, so mapping stays consistent with the tree.
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, TransactionError>`]. A
//! failing step records nothing: the transaction is unchanged and must not
//! be dispatched partially applied.

use smallvec::SmallVec;
use thiserror::Error;
use vellum_core::{
  Tendril,
  node::Node,
  resolve::{
    self,
    ResolveError,
    Resolved,
  },
};

use crate::selection::{
  Selection,
  SelectionError,
};

pub type Result<T> = std::result::Result<T, TransactionError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
  #[error("position {pos} out of bounds for document of length {len}")]
  PositionOutOfBounds { pos: usize, len: usize },
  #[error("invalid replace range {from}..{to}")]
  InvalidRange { from: usize, to: usize },
  #[error("document root is not a container")]
  RootNotContainer,
  #[error(transparent)]
  Resolve(#[from] ResolveError),
  #[error(transparent)]
  Selection(#[from] SelectionError),
}

/// Which side of an insertion/deletion boundary a mapped position prefers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Assoc {
  Before,
  After,
}

/// The position map of a single step: pure, value-like, composable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepMap {
  from:     usize,
  to:       usize,
  inserted: usize,
  len:      usize,
}

impl StepMap {
  /// Map for replacing `[from, to)` (token widths) with `inserted` tokens,
  /// in a document of pre-step length `len`.
  pub fn new(from: usize, to: usize, inserted: usize, len: usize) -> Self {
    Self {
      from,
      to,
      inserted,
      len,
    }
  }

  /// Document length after this step.
  pub fn len_after(&self) -> usize {
    self.len - (self.to - self.from) + self.inserted
  }

  /// Map a pre-step position to a post-step position.
  ///
  /// A position on the replaced range's edge sticks to that edge; a
  /// position strictly inside it, or at a pure insertion point, lands on
  /// the side `assoc` prefers.
  pub fn map(&self, pos: usize, assoc: Assoc) -> Result<usize> {
    if pos > self.len {
      return Err(TransactionError::PositionOutOfBounds { pos, len: self.len });
    }
    if pos < self.from {
      return Ok(pos);
    }
    if pos > self.to {
      return Ok(pos - (self.to - self.from) + self.inserted);
    }

    let side = if self.from == self.to {
      assoc
    } else if pos == self.from {
      Assoc::Before
    } else if pos == self.to {
      Assoc::After
    } else {
      assoc
    };

    Ok(match side {
      Assoc::Before => self.from,
      Assoc::After => self.from + self.inserted,
    })
  }
}

/// Ordered composition of step maps.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Mapping {
  maps: SmallVec<[StepMap; 1]>,
}

impl Mapping {
  pub fn push(&mut self, map: StepMap) {
    self.maps.push(map);
  }

  pub fn maps(&self) -> &[StepMap] {
    &self.maps
  }

  /// Fold a position through every step map in order.
  pub fn map(&self, pos: usize, assoc: Assoc) -> Result<usize> {
    self.maps.iter().try_fold(pos, |pos, map| map.map(pos, assoc))
  }
}

/// A structural edit step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
  /// Replace the children spanning `[from, to)` with `insert`.
  Replace {
    from:   usize,
    to:     usize,
    insert: Vec<Node>,
  },
}

impl Step {
  /// Token width contributed by the inserted content.
  pub fn inserted_size(&self) -> usize {
    match self {
      Step::Replace { insert, .. } => insert.iter().map(Node::size).sum(),
    }
  }
}

/// An edit description over a snapshot's tree and selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
  doc:              Node,
  before_selection: Selection,
  steps:            SmallVec<[Step; 1]>,
  mapping:          Mapping,
  selection:        Option<Selection>,
}

impl Transaction {
  /// Start a transaction over a snapshot's tree and selection. The caller
  /// keeps its snapshot; the transaction works on its own copy.
  pub fn new(doc: Node, selection: Selection) -> Self {
    Self {
      doc,
      before_selection: selection,
      steps: SmallVec::new(),
      mapping: Mapping::default(),
      selection: None,
    }
  }

  /// The tree with all recorded steps applied.
  pub fn doc(&self) -> &Node {
    &self.doc
  }

  pub fn steps(&self) -> &[Step] {
    &self.steps
  }

  pub fn mapping(&self) -> &Mapping {
    &self.mapping
  }

  /// When set, explicitly updates the selection.
  pub fn selection(&self) -> Option<&Selection> {
    self.selection.as_ref()
  }

  pub fn set_selection(&mut self, selection: Selection) {
    self.selection = Some(selection);
  }

  /// Map a pre-edit position through this transaction's own mapping. Only
  /// meaningful once all steps are assembled.
  pub fn map_pos(&self, pos: usize, assoc: Assoc) -> Result<usize> {
    self.mapping.map(pos, assoc)
  }

  /// The selection as it stands now: the explicit one if set, otherwise the
  /// snapshot's selection mapped through the recorded steps.
  pub fn current_selection(&self) -> Result<Selection> {
    match self.selection {
      Some(selection) => Ok(selection),
      None if self.steps.is_empty() => Ok(self.before_selection),
      None => self.map_selection(self.before_selection),
    }
  }

  fn map_selection(&self, selection: Selection) -> Result<Selection> {
    Ok(match selection {
      Selection::Range { anchor, head } => Selection::Range {
        anchor: self.mapping.map(anchor, Assoc::Before)?,
        head:   self.mapping.map(head, Assoc::Before)?,
      },
      Selection::Node { at } => {
        let at = self.mapping.map(at, Assoc::Before)?;
        // The selected node may not have survived the edit.
        Selection::node_at(&self.doc, at).unwrap_or(Selection::point(at))
      },
    })
  }

  /// Replace the current selection's span with a single node.
  pub fn replace_selection_with(&mut self, node: Node) -> Result<()> {
    let selection = self.current_selection()?;
    let from = selection.from();
    let to = selection.to(&self.doc)?;
    self.replace(from, to, vec![node])
  }

  /// Replace `[from, to)` with the given nodes, splitting text children at
  /// the edges and widening container edges to child boundaries of the
  /// deepest common ancestor. Records one step and its map; on error
  /// nothing is recorded.
  pub fn replace(&mut self, from: usize, to: usize, insert: Vec<Node>) -> Result<()> {
    if from > to {
      return Err(TransactionError::InvalidRange { from, to });
    }
    if !self.doc.is_container() {
      return Err(TransactionError::RootNotContainer);
    }

    let pre_len = self.doc.content_size();
    let (wfrom, wto, doc) = replace_range(&self.doc, from, to, &insert)?;
    let inserted: usize = insert.iter().map(Node::size).sum();

    self.mapping.push(StepMap::new(wfrom, wto, inserted, pre_len));
    self.steps.push(Step::Replace {
      from: wfrom,
      to: wto,
      insert,
    });
    self.doc = doc;
    Ok(())
  }

  /// Consume the transaction into its resulting tree and selection.
  pub(crate) fn into_parts(self) -> Result<(Node, Selection)> {
    let selection = self.current_selection()?;
    Ok((self.doc, selection))
  }
}

/// The slot a position occupies among a container's children: child index,
/// absolute offset of that child's start, and whether the position sits
/// exactly on that boundary.
fn child_slot(resolved: &Resolved, depth: usize, base: usize) -> (usize, usize, bool) {
  let index = resolved.index(depth);
  let child_start = if resolved.depth() == depth {
    let parent = resolved.node(depth);
    let preceding: usize = parent.children()[..index].iter().map(Node::size).sum();
    base + preceding
  } else {
    // The position descends further; the depth-level child opens just
    // before the next level's content.
    resolved.start(depth + 1) - 1
  };
  (index, child_start, child_start == resolved.pos())
}

/// Resolve `[from, to)` against the deepest common ancestor, splice in the
/// replacement, and rebuild the ancestor spine. Returns the effective
/// bounds (edges may widen to child boundaries) and the new tree.
fn replace_range(doc: &Node, from: usize, to: usize, insert: &[Node]) -> Result<(usize, usize, Node)> {
  let rfrom = resolve::resolve(doc, from)?;
  let rto = resolve::resolve(doc, to)?;

  // Deepest ancestor shared by both endpoints. Depth 0 (the root) always
  // qualifies.
  let mut depth = 0;
  for d in 1..=rfrom.depth().min(rto.depth()) {
    if std::ptr::eq(rfrom.node(d), rto.node(d)) {
      depth = d;
    } else {
      break;
    }
  }

  let ancestor = rfrom.node(depth);
  let base = rfrom.start(depth);
  let children = ancestor.children();

  // Leading edge: a text child splits at the exact offset (the prefix is
  // re-added as `lead`); a container child widens to its opening boundary.
  let (i, i_start, from_on_boundary) = child_slot(&rfrom, depth, base);
  let (start_index, wfrom, lead) = if from_on_boundary {
    (i, from, None)
  } else if rfrom.depth() == depth && children[i].is_text() {
    let child = &children[i];
    let prefix: Tendril = text_chars(child).take(from - i_start).collect();
    (i, from, Some(child.with_text(prefix)))
  } else {
    (i, i_start, None)
  };

  // Trailing edge, mirrored. A collapsed range shares the leading edge's
  // child, so the suffix of the same split text survives as `trail`.
  let (j, j_start, to_on_boundary) = child_slot(&rto, depth, base);
  let (end_index, wto, trail) = if to_on_boundary {
    (j, to, None)
  } else if rto.depth() == depth && children[j].is_text() {
    let child = &children[j];
    let suffix: Tendril = text_chars(child).skip(to - j_start).collect();
    (j + 1, to, Some(child.with_text(suffix)))
  } else {
    (j + 1, j_start + children[j].size(), None)
  };

  let replacement: Vec<Node> = lead
    .into_iter()
    .chain(insert.iter().cloned())
    .chain(trail)
    .collect();
  let mut spliced = children.to_vec();
  spliced.splice(start_index..end_index, replacement);
  let mut rebuilt = ancestor.with_children(spliced);

  for d in (1..=depth).rev() {
    let parent = rfrom.node(d - 1);
    let index = rfrom.index(d - 1);
    let mut siblings = parent.children().to_vec();
    siblings[index] = rebuilt;
    rebuilt = parent.with_children(siblings);
  }

  Ok((wfrom, wto, rebuilt))
}

fn text_chars(node: &Node) -> impl Iterator<Item = char> + '_ {
  node.as_text().unwrap_or_default().chars()
}

#[cfg(test)]
mod test {
  use vellum_core::node::Node;

  use super::*;
  use crate::fixtures;

  #[test]
  fn step_map_insertion_bias() {
    // Pure insertion of width 3 at position 4.
    let map = StepMap::new(4, 4, 3, 10);
    assert_eq!(map.map(2, Assoc::Before).unwrap(), 2);
    assert_eq!(map.map(4, Assoc::Before).unwrap(), 4);
    assert_eq!(map.map(4, Assoc::After).unwrap(), 7);
    assert_eq!(map.map(5, Assoc::Before).unwrap(), 8);
    assert_eq!(map.map(10, Assoc::After).unwrap(), 13);
  }

  #[test]
  fn step_map_deletion_collapses_interior() {
    // Delete [2, 5).
    let map = StepMap::new(2, 5, 0, 8);
    assert_eq!(map.map(1, Assoc::After).unwrap(), 1);
    assert_eq!(map.map(2, Assoc::After).unwrap(), 2);
    assert_eq!(map.map(3, Assoc::Before).unwrap(), 2);
    assert_eq!(map.map(3, Assoc::After).unwrap(), 2);
    assert_eq!(map.map(5, Assoc::Before).unwrap(), 2);
    assert_eq!(map.map(8, Assoc::Before).unwrap(), 5);
  }

  #[test]
  fn step_map_replacement_edges_stick() {
    // Replace [4, 6) with width 3.
    let map = StepMap::new(4, 6, 3, 10);
    assert_eq!(map.map(4, Assoc::After).unwrap(), 4); // edge beats bias
    assert_eq!(map.map(5, Assoc::Before).unwrap(), 4);
    assert_eq!(map.map(5, Assoc::After).unwrap(), 7);
    assert_eq!(map.map(6, Assoc::Before).unwrap(), 7);
    assert_eq!(map.map(8, Assoc::Before).unwrap(), 9);
    assert_eq!(map.len_after(), 11);
  }

  #[test]
  fn step_map_rejects_out_of_bounds() {
    let map = StepMap::new(0, 0, 1, 4);
    assert_eq!(map.map(5, Assoc::Before), Err(TransactionError::PositionOutOfBounds {
      pos: 5,
      len: 4,
    }));
  }

  #[test]
  fn mapping_folds_in_order() {
    let mut mapping = Mapping::default();
    mapping.push(StepMap::new(0, 0, 2, 10)); // +2 at front
    mapping.push(StepMap::new(4, 6, 0, 12)); // then delete [4, 6)
    // 3 -> 5 -> 4
    assert_eq!(mapping.map(3, Assoc::Before).unwrap(), 4);
  }

  #[test]
  fn replace_range_selection_with_node() {
    let doc = fixtures::doc();
    // Select the body's first para wholesale: [1, 8).
    let mut tr = Transaction::new(doc.clone(), Selection::range(1, 8));
    tr.replace_selection_with(fixtures::para("x")).unwrap();

    let [Step::Replace { from, to, .. }] = tr.steps() else {
      panic!("expected exactly one step");
    };
    assert_eq!((*from, *to), (1, 8));

    // para("x") is width 3; the document shrinks by 4.
    assert_eq!(tr.doc().content_size(), doc.content_size() - 4);
    let body = tr.doc().child(0).unwrap();
    assert_eq!(body.child(0).unwrap().child(0).unwrap().kind, "text");
  }

  #[test]
  fn replace_widens_partial_range_to_block_boundaries() {
    let doc = fixtures::doc();
    // [3, 11) cuts into the first para's text and the heading's text; the
    // common ancestor is the body, so both blocks are replaced whole.
    let mut tr = Transaction::new(doc, Selection::point(0));
    tr.replace(3, 11, vec![fixtures::rule()]).unwrap();

    let [Step::Replace { from, to, .. }] = tr.steps() else {
      panic!("expected exactly one step");
    };
    assert_eq!((*from, *to), (1, 15));

    let body = tr.doc().child(0).unwrap();
    assert_eq!(body.child_count(), 2);
    assert_eq!(body.child(0).unwrap().kind, "rule");
    assert_eq!(body.child(1).unwrap().kind, "rule");
  }

  #[test]
  fn collapsed_range_inside_text_splits_the_text() {
    let doc = fixtures::doc();
    // Cursor between 'e' and 'l' in "hello": the text splits and the node
    // lands exactly at the cursor.
    let mut tr = Transaction::new(doc, Selection::point(4));
    tr.replace_selection_with(fixtures::rule()).unwrap();

    let [Step::Replace { from, to, .. }] = tr.steps() else {
      panic!("expected exactly one step");
    };
    assert_eq!((*from, *to), (4, 4));

    let para = tr.doc().child(0).unwrap().child(0).unwrap();
    assert_eq!(para.child_count(), 3);
    assert_eq!(para.child(0).unwrap().as_text(), Some("he"));
    assert_eq!(para.child(1).unwrap().kind, "rule");
    assert_eq!(para.child(2).unwrap().as_text(), Some("llo"));
  }

  #[test]
  fn range_with_text_edges_cuts_exactly() {
    let doc = fixtures::doc();
    // "hello" occupies 2..7, so [3, 6) removes "ell".
    let mut tr = Transaction::new(doc, Selection::range(3, 6));
    tr.replace_selection_with(fixtures::rule()).unwrap();

    let [Step::Replace { from, to, .. }] = tr.steps() else {
      panic!("expected exactly one step");
    };
    assert_eq!((*from, *to), (3, 6));

    let para = tr.doc().child(0).unwrap().child(0).unwrap();
    assert_eq!(para.child(0).unwrap().as_text(), Some("h"));
    assert_eq!(para.child(1).unwrap().kind, "rule");
    assert_eq!(para.child(2).unwrap().as_text(), Some("o"));
  }

  #[test]
  fn replace_is_atomic_on_error() {
    let doc = fixtures::doc();
    let size = doc.content_size();
    let mut tr = Transaction::new(doc, Selection::point(0));
    assert!(tr.replace(0, size + 1, vec![fixtures::rule()]).is_err());
    assert!(tr.steps().is_empty());
    assert_eq!(tr.doc().content_size(), size);
  }

  #[test]
  fn unset_selection_maps_through_steps() {
    let doc = fixtures::doc();
    // Selection after the body's first para; inserting before it shifts it.
    let mut tr = Transaction::new(doc, Selection::point(15));
    tr.replace(1, 1, vec![fixtures::rule()]).unwrap();
    assert_eq!(tr.current_selection().unwrap(), Selection::point(16));
  }

  #[test]
  fn replaced_tree_length_matches_step_map() {
    let doc = fixtures::doc();
    let pre = doc.content_size();
    let mut tr = Transaction::new(doc, Selection::range(1, 8));
    tr.replace_selection_with(fixtures::para("x")).unwrap();
    assert_eq!(tr.mapping().maps()[0].len_after(), pre - 7 + 3);
    assert_eq!(tr.doc().content_size(), pre - 7 + 3);
  }

  #[test]
  fn spine_rebuild_preserves_unrelated_subtrees() {
    let doc = fixtures::doc();
    let note_before = doc.child(1).unwrap().clone();
    let mut tr = Transaction::new(doc, Selection::range(1, 8));
    tr.replace_selection_with(Node::leaf("rule")).unwrap();
    assert_eq!(tr.doc().child(1).unwrap(), &note_before);
  }
}
