//! Query and mutation primitives over a position-addressable document tree.
//!
//! Built on the node/resolution layer of `vellum-core`, this crate defines
//! everything that works against a document-state snapshot:
//!
//! - [`selection`] — the two selection shapes (range, node)
//! - [`transaction`] — edit descriptions with biased position maps
//! - [`query`] — the structural query engine
//! - [`inspect`] — selection-relative node state (active / insertable)
//! - [`state`] — snapshots, the transaction factory, and the
//!   insert-and-select mutator with its dispatch seam
//!
//! Everything is single-threaded and synchronous: snapshots are immutable
//! values, transactions describe derivations without touching their source,
//! and the dispatch sink is the only place a new snapshot appears.

pub mod inspect;
pub mod query;
pub mod selection;
pub mod state;
pub mod transaction;

#[cfg(test)]
pub(crate) mod fixtures;
