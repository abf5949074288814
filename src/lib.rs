//! # Ordered Index
//!
//! An in-memory B+ tree over totally-ordered keys: a one-column index that
//! stores keys only.
//!
//! ## Architecture
//!
//! - **Types** (`types`): node handles and the degree configuration
//! - **Index** (`index`): arena-backed nodes, the tree itself and the
//!   leaf-chain cursor
//!
//! Nodes live in an arena and refer to their parent, children and level
//! neighbours by [`NodeId`]. Full nodes split bottom-up on insert; on
//! delete an underflowing node borrows from a sibling under the same
//! parent or merges with it, and merges propagate upwards.
//!
//! ## Usage
//!
//! ```rust
//! use ordered_index::OrderedIndex;
//!
//! let mut index = OrderedIndex::new(3)?;
//! for key in 1..=5 {
//!     index.insert(key)?;
//! }
//!
//! assert!(index.search(&4).is_some());
//! assert!(index.insert(4).is_err());
//!
//! index.delete(&4)?;
//! assert!(index.search(&4).is_none());
//!
//! let keys: Vec<i32> = index.range(2..).copied().collect();
//! assert_eq!(keys, vec![2, 3, 5]);
//! # Ok::<(), ordered_index::IndexError>(())
//! ```

pub mod error;
pub mod index;
pub mod types;

pub use error::{IndexError, Result};
pub use types::{IndexConfig, NodeId, DEFAULT_DEGREE, MIN_DEGREE};

// Re-export main public API
pub use index::{Cursor, Node, NodeKind, OrderedIndex};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeBounds;
use std::sync::Arc;

/// Node type for visualization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Arena handle of the node
    pub node_id: u32,
    /// Whether this is a leaf node
    pub is_leaf: bool,
    /// Keys in this node, rendered with `Debug`
    pub keys: Vec<String>,
    /// Child nodes (only for internal nodes)
    pub children: Vec<TreeNode>,
}

/// Index statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Number of stored keys
    pub len: usize,
    /// Levels from the root to the leaves
    pub height: usize,
    /// Live nodes in the arena
    pub node_count: usize,
    /// Leaf nodes in the arena
    pub leaf_count: usize,
    /// Configured degree
    pub degree: usize,
}

/// Thread-safe handle to an ordered index
///
/// The tree itself assumes a single caller. This handle puts one
/// read-write lock around the whole structure: lookups share the read
/// lock, inserts and deletes take the write lock.
pub struct SharedIndex<K> {
    index: Arc<RwLock<OrderedIndex<K>>>,
}

impl<K> Clone for SharedIndex<K> {
    fn clone(&self) -> Self {
        Self {
            index: Arc::clone(&self.index),
        }
    }
}

impl<K: Ord + Clone + fmt::Debug> SharedIndex<K> {
    /// Create an empty shared index from a configuration
    pub fn open(config: &IndexConfig) -> Result<Self> {
        Ok(Self::from_index(OrderedIndex::with_config(config)?))
    }

    /// Wrap an existing index
    pub fn from_index(index: OrderedIndex<K>) -> Self {
        Self {
            index: Arc::new(RwLock::new(index)),
        }
    }

    /// Insert a key
    pub fn insert(&self, key: K) -> Result<()> {
        let mut index = self.index.write();
        index.insert(key)
    }

    /// Delete a key
    pub fn delete(&self, key: &K) -> Result<()> {
        let mut index = self.index.write();
        index.delete(key)
    }

    /// Check if a key exists
    pub fn contains(&self, key: &K) -> bool {
        let index = self.index.read();
        index.contains(key)
    }

    /// Keys inside `range`, in ascending order
    pub fn range<R: RangeBounds<K>>(&self, range: R) -> Vec<K> {
        let index = self.index.read();
        index.range(range).cloned().collect()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    /// Whether the index holds no keys
    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    /// Render the tree as a depth-indented dump
    pub fn render(&self) -> String {
        self.index.read().render()
    }

    /// Export the tree structure for visualization
    pub fn export(&self) -> TreeNode {
        self.index.read().export()
    }

    /// Get statistics about the index
    pub fn stats(&self) -> IndexStats {
        self.index.read().stats()
    }

    /// Check every structural invariant
    pub fn validate(&self) -> Result<()> {
        self.index.read().validate()
    }

    /// Run a closure against the locked index
    pub fn with_read<T>(&self, f: impl FnOnce(&OrderedIndex<K>) -> T) -> T {
        let index = self.index.read();
        f(&index)
    }
}
