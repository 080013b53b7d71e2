//! `markdeco-core` provides the document model shared by the markdeco engine.
//!
//! This crate is intentionally small and host-agnostic:
//!
//! - [`snapshot::Snapshot`]: an immutable text snapshot with a line-start
//!   table for offset ↔ position translation.
//! - [`tree::Node`] / [`tree::NodeKind`]: a byte-offset-bearing markdown
//!   tree, with a field-free [`tree::NodeTag`] for dispatch tables.
//! - [`parse::parse_tree`]: builds the tree from `pulldown-cmark`'s offset
//!   iterator.
//!
//! Higher-level functionality (state caching, the decoration pipeline,
//! annotation reconciliation) lives in `markdeco-engine`.
pub mod parse;
pub mod snapshot;
pub mod tree;

pub use parse::parse_tree;
pub use snapshot::Position;
pub use snapshot::Snapshot;
pub use snapshot::TextRange;
pub use tree::Node;
pub use tree::NodeKind;
pub use tree::NodeTag;
