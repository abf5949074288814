//! Ordered index implementation.
//!
//! This module provides an in-memory B+ tree that supports:
//! - Point lookups (search)
//! - Insertions (insert)
//! - Deletions (delete)
//! - Range scans over the leaf chain

mod arena;
mod cursor;
mod node;
mod tree;

pub use arena::NodeArena;
pub use cursor::Cursor;
pub use node::{Node, NodeKind};
pub use tree::OrderedIndex;
