//! Structural queries over the document tree.
//!
//! Every search here is predicate-parameterized: the same traversal
//! primitive serves arbitrary structural queries, and type-based lookup is
//! the thin specialization `|node| node.kind == kind`. All results carry a
//! [`NodeRef`], the matched node with its absolute position.
//!
//! # Error Handling
//!
//! Lookups that simply find nothing return `None` or an empty vector;
//! callers treat absence as a normal branch. The only error is a broken
//! structural invariant: [`QueryError::MissingBodyRegion`] when a query
//! assumes the single top-level body region and the tree has none.

use thiserror::Error;
use vellum_core::{
  node::{
    Node,
    NodeRef,
  },
  resolve,
  schema::region,
};

use crate::selection::Selection;

pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
  #[error("document has no body region among the root's children")]
  MissingBodyRegion,
}

/// Collect descendants of `parent` matching `predicate`, in document order.
/// Positions are relative to the start of `parent`'s content. `descend`
/// controls whether matching is recursive or over direct children only.
pub fn find_children<'a, P>(parent: &'a Node, mut predicate: P, descend: bool) -> Vec<NodeRef<'a>>
where
  P: FnMut(&Node) -> bool,
{
  let mut found = Vec::new();
  parent.descendants(&mut |node, pos| {
    if predicate(node) {
      found.push(NodeRef::new(node, pos));
    }
    descend
  });
  found
}

/// Type-based specialization of [`find_children`].
pub fn find_children_by_kind<'a>(parent: &'a Node, kind: &str, descend: bool) -> Vec<NodeRef<'a>> {
  find_children(parent, |node| node.kind == kind, descend)
}

/// Matches inside the single top-level body region, in document order, with
/// positions translated back into whole-tree coordinates.
///
/// Exactly one body region is assumed to exist among the root's direct
/// children; a tree without one fails with
/// [`QueryError::MissingBodyRegion`].
pub fn find_top_level_nodes<'a, P>(doc: &'a Node, predicate: P) -> Result<Vec<NodeRef<'a>>>
where
  P: FnMut(&Node) -> bool,
{
  let body = find_children_by_kind(doc, region::BODY, false)
    .into_iter()
    .next()
    .ok_or(QueryError::MissingBodyRegion)?;

  let offset = body.content_start();
  Ok(
    find_children(body.node, predicate, true)
      .into_iter()
      .map(|found| NodeRef::new(found.node, found.pos + offset))
      .collect(),
  )
}

/// The nearest ancestor of the selection head satisfying `predicate`,
/// walking outward from the deepest enclosing container. The root itself is
/// never reported: it has no position.
pub fn find_parent_node<'a, P>(doc: &'a Node, selection: &Selection, mut predicate: P) -> Option<NodeRef<'a>>
where
  P: FnMut(&Node) -> bool,
{
  let resolved = resolve::resolve(doc, selection.head()).ok()?;
  for d in (1..=resolved.depth()).rev() {
    let node = resolved.node(d);
    if predicate(node) {
      return Some(NodeRef::new(node, resolved.before(d)?));
    }
  }
  None
}

/// The wholly selected node, if the selection is a node selection of the
/// given kind.
pub fn find_selected_node_of_kind<'a>(doc: &'a Node, selection: &Selection, kind: &str) -> Option<NodeRef<'a>> {
  selection
    .selected_node(doc)
    .filter(|found| found.node.kind == kind)
}

/// A node of `kind` "in" the selection: the wholly selected node if it
/// matches, otherwise the nearest enclosing ancestor of that kind.
pub fn find_node_of_type_in_selection<'a>(
  doc: &'a Node,
  selection: &Selection,
  kind: &str,
) -> Option<NodeRef<'a>> {
  find_selected_node_of_kind(doc, selection, kind)
    .or_else(|| find_parent_node(doc, selection, |node| node.kind == kind))
}

/// First match in a pre-order traversal of `parent`'s content, with its
/// absolute position. Short-circuits once found.
pub fn first_node<'a, P>(parent: NodeRef<'a>, mut predicate: P) -> Option<NodeRef<'a>>
where
  P: FnMut(&Node) -> bool,
{
  let mut found = None;
  parent.node.descendants(&mut |node, pos| {
    if found.is_none() && predicate(node) {
      found = Some(NodeRef::new(node, parent.content_start() + pos));
      return false;
    }
    found.is_none()
  });
  found
}

/// Last match in a pre-order traversal of `parent`'s content: the full
/// subtree is walked and the latest match kept.
pub fn last_node<'a, P>(parent: NodeRef<'a>, mut predicate: P) -> Option<NodeRef<'a>>
where
  P: FnMut(&Node) -> bool,
{
  let mut found = None;
  parent.node.descendants(&mut |node, pos| {
    if predicate(node) {
      found = Some(NodeRef::new(node, parent.content_start() + pos));
    }
    true
  });
  found
}

/// The editable root enclosing the selection: the nearest body region,
/// falling back to the nearest note region. `None` when the selection sits
/// outside any editable root.
pub fn editing_root_node<'a>(doc: &'a Node, selection: &Selection) -> Option<NodeRef<'a>> {
  find_parent_node(doc, selection, |node| node.kind == region::BODY)
    .or_else(|| find_parent_node(doc, selection, |node| node.kind == region::NOTE))
}
