//! Index cursor for iteration.
//!
//! The cursor walks the leaf level from left to right through the
//! `right` neighbour links, so a range scan costs one descent plus a
//! linear pass over the covered leaves.

use crate::index::arena::NodeArena;
use crate::types::NodeId;
use std::ops::Bound;

/// A cursor over the keys of an index in ascending order
pub struct Cursor<'a, K> {
    /// Node storage of the index being scanned
    nodes: &'a NodeArena<K>,
    /// Current leaf, `None` once the chain is exhausted
    leaf: Option<NodeId>,
    /// Position of the next key within the current leaf
    pos: usize,
    /// Upper bound of the scan
    end: Bound<K>,
}

impl<'a, K: Ord> Cursor<'a, K> {
    pub(crate) fn new(nodes: &'a NodeArena<K>, leaf: NodeId, pos: usize, end: Bound<K>) -> Self {
        Self {
            nodes,
            leaf: Some(leaf),
            pos,
            end,
        }
    }

    /// Check if the cursor can still yield keys
    pub fn is_valid(&self) -> bool {
        self.leaf.is_some()
    }

    fn within_end(&self, key: &K) -> bool {
        match &self.end {
            Bound::Unbounded => true,
            Bound::Included(end) => key <= end,
            Bound::Excluded(end) => key < end,
        }
    }
}

impl<'a, K: Ord> Iterator for Cursor<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        let nodes: &'a NodeArena<K> = self.nodes;
        while let Some(leaf) = self.leaf {
            let node = &nodes[leaf];

            if let Some(key) = node.keys().get(self.pos) {
                if !self.within_end(key) {
                    self.leaf = None;
                    return None;
                }
                self.pos += 1;
                return Some(key);
            }

            // Leaf exhausted, follow the level link
            self.leaf = node.right();
            self.pos = 0;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::node::Node;

    fn chain(leaves: &[&[i32]]) -> (NodeArena<i32>, NodeId) {
        let mut arena = NodeArena::new();
        let ids: Vec<NodeId> = leaves
            .iter()
            .map(|keys| {
                let mut node = Node::new_leaf();
                node.keys = keys.to_vec();
                arena.alloc(node)
            })
            .collect();
        for pair in ids.windows(2) {
            arena[pair[0]].right = Some(pair[1]);
            arena[pair[1]].left = Some(pair[0]);
        }
        (arena, ids[0])
    }

    #[test]
    fn test_cursor_walks_leaf_chain() {
        let (arena, first) = chain(&[&[1, 2], &[], &[5], &[8, 9]]);
        let cursor = Cursor::new(&arena, first, 0, Bound::Unbounded);
        assert_eq!(cursor.copied().collect::<Vec<_>>(), vec![1, 2, 5, 8, 9]);
    }

    #[test]
    fn test_cursor_respects_end_bound() {
        let (arena, first) = chain(&[&[1, 2], &[5], &[8, 9]]);

        let included = Cursor::new(&arena, first, 1, Bound::Included(8));
        assert_eq!(included.copied().collect::<Vec<_>>(), vec![2, 5, 8]);

        let mut excluded = Cursor::new(&arena, first, 0, Bound::Excluded(5));
        assert_eq!(excluded.next(), Some(&1));
        assert_eq!(excluded.next(), Some(&2));
        assert_eq!(excluded.next(), None);
        assert!(!excluded.is_valid());
    }
}
