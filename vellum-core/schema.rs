//! The seam to the externally supplied type registry.
//!
//! This core never implements content-model rules itself; it only asks an
//! opaque [`Schema`] whether a structural edit would be valid. Callers hand
//! in whatever registry their editor host defines.

use crate::node::Node;

/// Content-model validity queries against the external type registry.
pub trait Schema {
  /// Whether `parent`'s content model permits replacing the child slot at
  /// `index` with a node of type `kind`. Checks the parent's own structural
  /// rules, not the target node's.
  fn can_replace_with(&self, parent: &Node, index: usize, kind: &str) -> bool;
}

/// Named region type names. Regions are structurally distinguished
/// containers located by type, never by position.
pub mod region {
  /// The single top-level editable region. Assumed to appear at most once
  /// among the root's direct children.
  pub const BODY: &str = "body";

  /// A footnote region. May nest outside any body.
  pub const NOTE: &str = "note";
}
