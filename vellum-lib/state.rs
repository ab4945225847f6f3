//! Document-state snapshots and the transactional mutator.
//!
//! A [`State`] is an immutable snapshot: the tree plus the current
//! selection. Reads never touch it; edits describe a derivation via
//! [`State::transaction`] and commit it through a caller-supplied dispatch
//! sink, the single point where a new snapshot becomes visible.
//!
//! ```ignore
//! let mut next = None;
//! insert_and_select_node(node, &state, |tr| {
//!   next = Some(state.apply(tr));
//! })?;
//! ```

use vellum_core::node::Node;

use crate::{
  selection::Selection,
  transaction::{
    Assoc,
    Result,
    Transaction,
  },
};

/// An immutable document-state snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
  doc:       Node,
  selection: Selection,
}

impl State {
  pub fn new(doc: Node, selection: Selection) -> Self {
    Self { doc, selection }
  }

  pub fn doc(&self) -> &Node {
    &self.doc
  }

  pub fn selection(&self) -> &Selection {
    &self.selection
  }

  /// Start a transaction over this snapshot. The transaction works on its
  /// own copy of the tree; this snapshot is unaffected until a dispatch
  /// sink applies the result.
  pub fn transaction(&self) -> Transaction {
    Transaction::new(self.doc.clone(), self.selection)
  }

  /// Derive the next snapshot from a fully assembled transaction.
  pub fn apply(&self, tr: Transaction) -> Result<State> {
    let (doc, selection) = tr.into_parts()?;
    Ok(State { doc, selection })
  }
}

/// Replace the current selection with `node` and re-establish the selection
/// on the inserted node.
///
/// The pre-edit selection start is mapped through the transaction's own
/// mapping with [`Assoc::Before`], so the point lands immediately before
/// the inserted node; a node selection is then constructed there against
/// the transaction's resulting tree. The transaction reaches `dispatch`
/// exactly once, fully assembled, or not at all on error.
pub fn insert_and_select_node(node: Node, state: &State, dispatch: impl FnOnce(Transaction)) -> Result<()> {
  let mut tr = state.transaction();
  tr.replace_selection_with(node)?;

  let pos = tr.map_pos(state.selection().from(), Assoc::Before)?;
  let selection = Selection::node_at(tr.doc(), pos)?;
  tr.set_selection(selection);

  tracing::trace!(?selection, steps = tr.steps().len(), "insert and select node");
  dispatch(tr);
  Ok(())
}
