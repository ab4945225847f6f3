//! Selection-relative node state.
//!
//! Two questions a toolbar or command layer keeps asking about the current
//! snapshot: "is the selection inside a node of this type?" and "could a
//! node of this type be inserted here?". Both are pure reads; both report
//! absence as `false`, never as an error.

use vellum_core::{
  node::Attrs,
  resolve,
  schema::Schema,
};

use crate::{
  query::find_node_of_type_in_selection,
  state::State,
};

/// Whether the selection is inside, or is a node selection of, a node of
/// `kind`.
///
/// With `attrs` supplied and non-empty, the found node must additionally
/// match every given key. Only the supplied keys are checked: extra
/// attributes on the node never disqualify it.
pub fn node_is_active(state: &State, kind: &str, attrs: Option<&Attrs>) -> bool {
  let found = find_node_of_type_in_selection(state.doc(), state.selection(), kind);

  let Some(found) = found else {
    return false;
  };
  match attrs {
    None => true,
    Some(attrs) if attrs.is_empty() => true,
    Some(attrs) => found.node.has_markup(kind, attrs),
  }
}

/// Whether a node of `kind` is structurally insertable at the selection:
/// starting at the selection's deepest ancestor and walking outward to the
/// root inclusive, true as soon as any ancestor's content model permits
/// replacing its child at the selection's index with `kind`.
pub fn can_insert_node(state: &State, schema: &impl Schema, kind: &str) -> bool {
  let Ok(resolved) = resolve::resolve(state.doc(), state.selection().from()) else {
    return false;
  };
  for d in (0..=resolved.depth()).rev() {
    if schema.can_replace_with(resolved.node(d), resolved.index(d), kind) {
      return true;
    }
  }
  false
}

#[cfg(test)]
mod test {
  use serde_json::json;
  use vellum_core::node::Attrs;

  use super::*;
  use crate::{
    fixtures::{
      self,
      RuleSchema,
    },
    selection::Selection,
  };

  fn attrs(pairs: &[(&str, serde_json::Value)]) -> Attrs {
    pairs
      .iter()
      .map(|(key, value)| (key.to_string(), value.clone()))
      .collect()
  }

  #[test]
  fn active_via_enclosing_ancestor() {
    let state = State::new(fixtures::doc(), Selection::point(10));
    assert!(node_is_active(&state, "heading", None));
    assert!(node_is_active(&state, "body", None));
    assert!(!node_is_active(&state, "note", None));
  }

  #[test]
  fn active_via_node_selection() {
    let doc = fixtures::doc();
    let selection = Selection::node_at(&doc, 1).unwrap();
    let state = State::new(doc, selection);
    assert!(node_is_active(&state, "para", None));
  }

  #[test]
  fn attrs_narrow_the_match() {
    // The fixture heading carries level = 1.
    let state = State::new(fixtures::doc(), Selection::point(10));
    assert!(node_is_active(&state, "heading", Some(&attrs(&[("level", json!(1))]))));
    assert!(!node_is_active(&state, "heading", Some(&attrs(&[("level", json!(2))]))));
    // An empty attribute map is no constraint at all.
    assert!(node_is_active(&state, "heading", Some(&Attrs::new())));
  }

  #[test]
  fn can_insert_checks_ancestors_outward() {
    // Cursor deep inside the body's first para.
    let state = State::new(fixtures::doc(), Selection::point(3));

    // The para refuses everything, but the body accepts rules.
    let schema = RuleSchema::new(&[("body", "rule")]);
    assert!(can_insert_node(&state, &schema, "rule"));

    // The root accepts notes, reachable from anywhere.
    let schema = RuleSchema::new(&[("doc", "note")]);
    assert!(can_insert_node(&state, &schema, "note"));
  }

  #[test]
  fn can_insert_is_false_when_every_level_refuses() {
    let state = State::new(fixtures::doc(), Selection::point(3));
    let schema = RuleSchema::new(&[]);
    assert!(!can_insert_node(&state, &schema, "rule"));

    let schema = RuleSchema::new(&[("note", "para")]);
    assert!(!can_insert_node(&state, &schema, "para"));
  }
}
