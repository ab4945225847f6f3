//! Shared test documents and a rule-table schema double.

use std::collections::HashMap;

use serde_json::json;
use vellum_core::{
  node::{
    Attrs,
    Node,
  },
  schema::Schema,
};

pub(crate) fn para(text: &str) -> Node {
  Node::container("para", vec![Node::text(text)])
}

pub(crate) fn heading(level: u64, text: &str) -> Node {
  let mut attrs = Attrs::new();
  attrs.insert("level".to_string(), json!(level));
  Node::container("heading", vec![Node::text(text)]).with_attrs(attrs)
}

pub(crate) fn rule() -> Node {
  Node::leaf("rule")
}

pub(crate) fn body(children: Vec<Node>) -> Node {
  Node::container("body", children)
}

pub(crate) fn note(children: Vec<Node>) -> Node {
  Node::container("note", children)
}

/// The canonical test document:
///
/// ```text
/// 0 body 1 para 2 "hello" 7 /para 8 heading 9 "title" 14 /heading
/// 15 rule 16 /body 17 note 18 para 19 "note text" 28 /para 29 /note 30
/// ```
pub(crate) fn doc() -> Node {
  Node::container("doc", vec![
    body(vec![para("hello"), heading(1, "title"), rule()]),
    note(vec![para("note text")]),
  ])
}

/// Content rules keyed by parent kind: which child kinds each parent
/// accepts, regardless of index.
pub(crate) struct RuleSchema {
  rules: HashMap<&'static str, Vec<&'static str>>,
}

impl RuleSchema {
  pub(crate) fn new(rules: &[(&'static str, &'static str)]) -> Self {
    let mut map: HashMap<&'static str, Vec<&'static str>> = HashMap::new();
    for (parent, child) in rules {
      map.entry(parent).or_default().push(child);
    }
    Self { rules: map }
  }
}

impl Schema for RuleSchema {
  fn can_replace_with(&self, parent: &Node, _index: usize, kind: &str) -> bool {
    self
      .rules
      .get(parent.kind.as_str())
      .is_some_and(|kinds| kinds.contains(&kind))
  }
}
