use smartstring::{
  LazyCompact,
  SmartString,
};

pub mod node;
pub mod resolve;
pub mod schema;

/// Small-string type used for node kind names and text content.
pub type Tendril = SmartString<LazyCompact>;
