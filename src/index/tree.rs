//! Ordered index core implementation.
//!
//! This module provides the main OrderedIndex struct with operations for:
//! - search: Point lookups
//! - insert: Insertions (duplicates rejected)
//! - delete: Removals with redistribution and merge
//! - render: Diagnostic dump of the tree

use crate::error::{IndexError, Result};
use crate::index::arena::NodeArena;
use crate::index::cursor::Cursor;
use crate::index::node::{Node, NodeKind};
use crate::types::{IndexConfig, NodeId};
use crate::{IndexStats, TreeNode};
use std::fmt;
use std::ops::{Bound, RangeBounds};
use tracing::{debug, trace};

/// An in-memory B+ tree over totally-ordered keys
#[derive(Debug, Clone)]
pub struct OrderedIndex<K> {
    /// Node storage
    nodes: NodeArena<K>,
    /// Root node (a leaf while the tree fits in one node)
    root: NodeId,
    /// Branching configuration
    config: IndexConfig,
    /// Number of stored keys
    len: usize,
}

impl<K: Ord + Clone + fmt::Debug> OrderedIndex<K> {
    /// Create an empty index with the given degree
    pub fn new(degree: usize) -> Result<Self> {
        Self::with_config(&IndexConfig::new(degree))
    }

    /// Create an empty index from a configuration
    pub fn with_config(config: &IndexConfig) -> Result<Self> {
        config.validate()?;

        let mut nodes = NodeArena::new();
        let root = nodes.alloc(Node::new_leaf());

        Ok(Self {
            nodes,
            root,
            config: config.clone(),
            len: 0,
        })
    }

    /// Get the index configuration
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Maximum keys per node before a split
    pub fn degree(&self) -> usize {
        self.config.degree
    }

    /// Minimum keys a non-root leaf keeps after a delete
    pub fn minimum_occupancy(&self) -> usize {
        self.config.min_leaf_keys()
    }

    /// Get the root node ID
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Look up a node by handle
    pub fn node(&self, id: NodeId) -> Option<&Node<K>> {
        self.nodes.get(id)
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no keys
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels from the root down to the leaves
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut id = self.root;
        while let Some(&child) = self.nodes[id].children().first() {
            id = child;
            height += 1;
        }
        height
    }

    /// Look up a key and return the leaf holding it
    ///
    /// Returns `None` if the key is not stored.
    pub fn search(&self, key: &K) -> Option<&Node<K>> {
        let leaf = &self.nodes[self.find_leaf(key)];
        if leaf.contains(key) {
            Some(leaf)
        } else {
            None
        }
    }

    /// Check if a key is stored
    pub fn contains(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    /// Descend to the leaf whose range covers `key`.
    ///
    /// Returns the leaf and its position among its parent's children
    /// (`None` when the root is the leaf). Every child passed through has
    /// its parent reference reset to the node it was reached from.
    pub fn locate(&mut self, key: &K) -> (NodeId, Option<usize>) {
        let mut id = self.root;
        let mut pos_in_parent = None;

        loop {
            let node = &self.nodes[id];
            let (child, idx) = match &node.kind {
                NodeKind::Leaf => return (id, pos_in_parent),
                NodeKind::Internal { children } => {
                    let idx = node.child_index(key);
                    (children[idx], idx)
                }
            };

            trace!(node = %id, child = %child, idx, "descend");
            self.nodes[child].parent = Some(id);
            pos_in_parent = Some(idx);
            id = child;
        }
    }

    /// Insert a key
    ///
    /// Fails with `DuplicateKey` if the key is already stored; the tree is
    /// left untouched in that case.
    pub fn insert(&mut self, key: K) -> Result<()> {
        let (leaf, _) = self.find_for_insert(&key)?;

        let node = &mut self.nodes[leaf];
        let idx = node.keys.partition_point(|k| k < &key);
        trace!(leaf = %leaf, idx, ?key, "insert into leaf");
        node.keys.insert(idx, key);
        self.len += 1;

        self.handle_overflow(leaf);
        Ok(())
    }

    /// Delete a key
    ///
    /// Fails with `KeyNotFound` if the key is not stored.
    pub fn delete(&mut self, key: &K) -> Result<()> {
        let (leaf, _) = self.find_for_delete(key)?;

        let node = &mut self.nodes[leaf];
        let fits = node.keys.len() > self.config.min_leaf_keys();
        let idx = node
            .keys
            .binary_search(key)
            .map_err(|_| IndexError::not_found(key))?;
        node.keys.remove(idx);
        self.len -= 1;
        trace!(leaf = %leaf, ?key, "remove from leaf");

        if !fits {
            self.handle_rebalancing(leaf);
        }
        Ok(())
    }

    /// Iterate over all keys in ascending order
    pub fn iter(&self) -> Cursor<'_, K> {
        self.range(..)
    }

    /// Iterate over the keys inside `range` in ascending order
    pub fn range<R: RangeBounds<K>>(&self, range: R) -> Cursor<'_, K> {
        let (leaf, pos) = match range.start_bound() {
            Bound::Unbounded => (self.leftmost_leaf(), 0),
            Bound::Included(start) => {
                let leaf = self.find_leaf(start);
                (leaf, self.nodes[leaf].keys.partition_point(|k| k < start))
            }
            Bound::Excluded(start) => {
                let leaf = self.find_leaf(start);
                (leaf, self.nodes[leaf].keys.partition_point(|k| k <= start))
            }
        };

        Cursor::new(&self.nodes, leaf, pos, range.end_bound().cloned())
    }

    /// Smallest stored key
    pub fn first(&self) -> Option<&K> {
        self.iter().next()
    }

    /// Largest stored key
    pub fn last(&self) -> Option<&K> {
        let mut id = Some(self.rightmost_leaf());
        while let Some(leaf) = id {
            let node = &self.nodes[leaf];
            if let Some(key) = node.keys.last() {
                return Some(key);
            }
            id = node.left;
        }
        None
    }

    /// Render the whole tree as a depth-indented dump
    pub fn render(&self) -> String {
        self.render_subtree(self.root)
    }

    /// Render the subtree under `id`, one line per node
    pub fn render_subtree(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render_node(id, 0, &mut out);
        out
    }

    fn render_node(&self, id: NodeId, level: usize, out: &mut String) {
        let node = &self.nodes[id];
        out.push_str(&format!(
            "{}Keys: {:?}, IsLeaf: {}\n",
            " ".repeat(level * 4),
            node.keys,
            if node.is_leaf() { "True" } else { "False" }
        ));
        for &child in node.children() {
            self.render_node(child, level + 1, out);
        }
    }

    /// Export the tree structure for visualization
    pub fn export(&self) -> TreeNode {
        self.export_node(self.root)
    }

    fn export_node(&self, id: NodeId) -> TreeNode {
        let node = &self.nodes[id];
        TreeNode {
            node_id: id.value(),
            is_leaf: node.is_leaf(),
            keys: node.keys.iter().map(|k| format!("{:?}", k)).collect(),
            children: node
                .children()
                .iter()
                .map(|&child| self.export_node(child))
                .collect(),
        }
    }

    /// Get statistics about the index
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            len: self.len,
            height: self.height(),
            node_count: self.nodes.len(),
            leaf_count: self.nodes.iter().filter(|(_, n)| n.is_leaf()).count(),
            degree: self.config.degree,
        }
    }

    /// Descend without touching parent references
    fn find_leaf(&self, key: &K) -> NodeId {
        let mut id = self.root;
        loop {
            let node = &self.nodes[id];
            match &node.kind {
                NodeKind::Leaf => return id,
                NodeKind::Internal { children } => id = children[node.child_index(key)],
            }
        }
    }

    fn leftmost_leaf(&self) -> NodeId {
        let mut id = self.root;
        while let Some(&child) = self.nodes[id].children().first() {
            id = child;
        }
        id
    }

    fn rightmost_leaf(&self) -> NodeId {
        let mut id = self.root;
        while let Some(&child) = self.nodes[id].children().last() {
            id = child;
        }
        id
    }

    fn find_for_insert(&mut self, key: &K) -> Result<(NodeId, Option<usize>)> {
        let found = self.locate(key);
        if self.nodes[found.0].contains(key) {
            return Err(IndexError::duplicate(key));
        }
        Ok(found)
    }

    fn find_for_delete(&mut self, key: &K) -> Result<(NodeId, Option<usize>)> {
        let found = self.locate(key);
        if !self.nodes[found.0].contains(key) {
            return Err(IndexError::not_found(key));
        }
        Ok(found)
    }

    fn parent_of(&self, id: NodeId) -> NodeId {
        match self.nodes[id].parent {
            Some(parent) => parent,
            None => panic!("non-root node {} has no parent", id),
        }
    }

    /// Position of `child` in `parent`, recomputed from the children list
    fn position_in_parent(&self, parent: NodeId, child: NodeId) -> usize {
        match self.nodes[parent].child_position(child) {
            Some(pos) => pos,
            None => panic!("node {} is not a child of {}", child, parent),
        }
    }

    fn min_keys(&self, id: NodeId) -> usize {
        if self.nodes[id].is_leaf() {
            self.config.min_leaf_keys()
        } else {
            self.config.min_internal_keys()
        }
    }

    /// Split nodes bottom-up until every node on the path is below degree
    fn handle_overflow(&mut self, mut id: NodeId) {
        while self.nodes[id].keys.len() >= self.config.degree {
            id = self.split(id);
        }
    }

    /// Split a full node in two and return the parent that received the
    /// separator
    fn split(&mut self, id: NodeId) -> NodeId {
        let node = &mut self.nodes[id];
        let mid = node.keys.len() / 2;
        let mut right_keys = node.keys.split_off(mid);

        // Leaves keep the separator as a stored key; internal nodes hand it
        // up and pass the upper half of their children to the new node.
        let (separator, kind) = match &mut node.kind {
            NodeKind::Leaf => (right_keys[0].clone(), NodeKind::Leaf),
            NodeKind::Internal { children } => {
                let moved = children.split_off(mid + 1);
                (right_keys.remove(0), NodeKind::Internal { children: moved })
            }
        };

        let parent = node.parent;
        let old_right = node.right;
        let new_id = self.nodes.alloc(Node {
            keys: right_keys,
            kind,
            parent,
            left: Some(id),
            right: old_right,
        });

        self.nodes[id].right = Some(new_id);
        if let Some(right) = old_right {
            self.nodes[right].left = Some(new_id);
        }
        let moved = self.nodes[new_id].children().to_vec();
        for child in moved {
            self.nodes[child].parent = Some(new_id);
        }

        debug!(
            node = %id,
            new_node = %new_id,
            leaf = self.nodes[id].is_leaf(),
            ?separator,
            "split node"
        );

        match parent {
            None => {
                let root = self
                    .nodes
                    .alloc(Node::new_internal(vec![separator], vec![id, new_id]));
                self.nodes[id].parent = Some(root);
                self.nodes[new_id].parent = Some(root);
                self.root = root;
                debug!(root = %root, height = self.height(), "grew new root");
                root
            }
            Some(parent) => {
                let pos = self.position_in_parent(parent, id);
                let parent_node = &mut self.nodes[parent];
                parent_node.keys.insert(pos, separator);
                parent_node.children_mut().insert(pos + 1, new_id);
                parent
            }
        }
    }

    /// Restore minimum occupancy from `id` upwards after a removal
    fn handle_rebalancing(&mut self, mut id: NodeId) {
        loop {
            if id == self.root {
                self.collapse_root();
                return;
            }

            let min = self.min_keys(id);
            if self.nodes[id].keys.len() >= min {
                return;
            }

            let parent = self.parent_of(id);
            let left = self.same_parent_sibling(id, self.nodes[id].left);
            let right = self.same_parent_sibling(id, self.nodes[id].right);

            if let Some(left) = left.filter(|&l| self.nodes[l].keys.len() > min) {
                self.redistribute(left, id);
                return;
            }
            if let Some(right) = right.filter(|&r| self.nodes[r].keys.len() > min) {
                self.redistribute(id, right);
                return;
            }

            match (left, right) {
                (Some(left), _) => self.merge(left, id),
                (None, Some(right)) => self.merge(id, right),
                (None, None) => {
                    if !self.widen_only_child(parent) {
                        debug!(node = %id, keys = self.nodes[id].keys.len(), min, "underflow left in place: no sibling under the same parent");
                        return;
                    }
                    // The parent now holds a neighbour of `id`; retry.
                    continue;
                }
            }

            id = parent;
        }
    }

    /// Give the internal node `id`, whose only child is underfull, a second
    /// child.
    ///
    /// Only degree 2 gets here: an internal split there leaves a key-less
    /// node with one child. The node borrows a child from a neighbour that
    /// can spare one, or merges with a neighbour that cannot. Returns
    /// `false` if no neighbour exists.
    fn widen_only_child(&mut self, id: NodeId) -> bool {
        if id == self.root {
            return false;
        }

        let mut left = self.same_parent_sibling(id, self.nodes[id].left);
        let mut right = self.same_parent_sibling(id, self.nodes[id].right);
        if left.is_none() && right.is_none() {
            let parent = self.parent_of(id);
            if !self.widen_only_child(parent) {
                return false;
            }
            left = self.same_parent_sibling(id, self.nodes[id].left);
            right = self.same_parent_sibling(id, self.nodes[id].right);
        }

        let min = self.config.min_internal_keys();
        if let Some(left) = left.filter(|&l| self.nodes[l].keys.len() > min) {
            self.borrow_from_left(left, id);
            return true;
        }
        if let Some(right) = right.filter(|&r| self.nodes[r].keys.len() > min) {
            self.borrow_from_right(id, right);
            return true;
        }

        let parent = self.parent_of(id);
        match (left, right) {
            (Some(left), _) => self.merge(left, id),
            (None, Some(right)) => self.merge(id, right),
            (None, None) => return false,
        }
        self.handle_rebalancing(parent);
        true
    }

    /// Move the last child of `left` to the front of `right`, rotating the
    /// parent separator down into `right`
    fn borrow_from_left(&mut self, left: NodeId, right: NodeId) {
        let parent = self.parent_of(right);
        let sep_idx = self.position_in_parent(parent, right) - 1;

        let left_node = &mut self.nodes[left];
        let (key, child) = match (left_node.keys.pop(), left_node.children_mut().pop()) {
            (Some(key), Some(child)) => (key, child),
            _ => panic!("node {} has no child to lend", left),
        };

        let separator = std::mem::replace(&mut self.nodes[parent].keys[sep_idx], key);
        let right_node = &mut self.nodes[right];
        right_node.keys.insert(0, separator);
        right_node.children_mut().insert(0, child);
        self.nodes[child].parent = Some(right);

        debug!(from = %left, to = %right, child = %child, "borrowed child");
    }

    /// Move the first child of `right` to the end of `left`, rotating the
    /// parent separator down into `left`
    fn borrow_from_right(&mut self, left: NodeId, right: NodeId) {
        let parent = self.parent_of(left);
        let sep_idx = self.position_in_parent(parent, right) - 1;

        let right_node = &mut self.nodes[right];
        if right_node.keys.is_empty() {
            panic!("node {} has no child to lend", right);
        }
        let key = right_node.keys.remove(0);
        let child = right_node.children_mut().remove(0);

        let separator = std::mem::replace(&mut self.nodes[parent].keys[sep_idx], key);
        let left_node = &mut self.nodes[left];
        left_node.keys.push(separator);
        left_node.children_mut().push(child);
        self.nodes[child].parent = Some(left);

        debug!(from = %right, to = %left, child = %child, "borrowed child");
    }

    /// Level neighbour, if it hangs off the same parent as `id`
    fn same_parent_sibling(&self, id: NodeId, neighbour: Option<NodeId>) -> Option<NodeId> {
        let neighbour = neighbour?;
        if self.nodes[neighbour].parent == self.nodes[id].parent {
            Some(neighbour)
        } else {
            None
        }
    }

    /// Even out keys between two adjacent nodes of the same parent
    fn redistribute(&mut self, left: NodeId, right: NodeId) {
        let parent = self.parent_of(left);
        let sep_idx = self.position_in_parent(parent, right) - 1;

        let mut keys = std::mem::take(&mut self.nodes[left].keys);
        let mut right_keys = std::mem::take(&mut self.nodes[right].keys);

        let separator = if self.nodes[left].is_leaf() {
            keys.append(&mut right_keys);
            let upper = keys.split_off(keys.len() / 2);
            let separator = upper[0].clone();
            self.nodes[left].keys = keys;
            self.nodes[right].keys = upper;
            separator
        } else {
            // Rotate through the parent separator.
            keys.push(self.nodes[parent].keys[sep_idx].clone());
            keys.append(&mut right_keys);

            let mut children = std::mem::take(self.nodes[left].children_mut());
            children.append(self.nodes[right].children_mut());

            let mid = keys.len() / 2;
            let mut upper = keys.split_off(mid);
            let separator = upper.remove(0);
            let right_children = children.split_off(mid + 1);

            for &child in &children {
                self.nodes[child].parent = Some(left);
            }
            for &child in &right_children {
                self.nodes[child].parent = Some(right);
            }

            self.nodes[left].keys = keys;
            *self.nodes[left].children_mut() = children;
            self.nodes[right].keys = upper;
            *self.nodes[right].children_mut() = right_children;
            separator
        };

        debug!(left = %left, right = %right, ?separator, "redistributed keys");
        self.nodes[parent].keys[sep_idx] = separator;
    }

    /// Fold `right` into `left` and drop it from the parent
    fn merge(&mut self, left: NodeId, right: NodeId) {
        let parent = self.parent_of(left);
        let right_pos = self.position_in_parent(parent, right);

        let parent_node = &mut self.nodes[parent];
        parent_node.children_mut().remove(right_pos);
        let separator = parent_node.keys.remove(right_pos - 1);

        let removed = match self.nodes.free(right) {
            Some(node) => node,
            None => panic!("stale node handle {}", right),
        };

        let left_node = &mut self.nodes[left];
        left_node.right = removed.right;
        let moved = match removed.kind {
            NodeKind::Leaf => {
                left_node.keys.extend(removed.keys);
                Vec::new()
            }
            NodeKind::Internal { children } => {
                left_node.keys.push(separator);
                left_node.keys.extend(removed.keys);
                left_node.children_mut().extend(children.iter().copied());
                children
            }
        };

        if let Some(next) = removed.right {
            self.nodes[next].left = Some(left);
        }
        for child in moved {
            self.nodes[child].parent = Some(left);
        }

        debug!(left = %left, removed = %right, parent = %parent, "merged nodes");
    }

    /// Replace a key-less internal root by its only child
    fn collapse_root(&mut self) {
        loop {
            let root = &self.nodes[self.root];
            let child = match root.children() {
                [only] if root.keys.is_empty() => *only,
                _ => return,
            };

            self.nodes.free(self.root);
            self.nodes[child].parent = None;
            debug!(old_root = %self.root, new_root = %child, "collapsed root");
            self.root = child;
        }
    }

    /// Check every structural invariant of the tree
    pub fn validate(&self) -> Result<()> {
        let root = self.nodes.get(self.root).ok_or_else(|| {
            IndexError::corruption(format!("root {} is not a live node", self.root))
        })?;
        if root.parent.is_some() {
            return Err(IndexError::corruption("root has a parent"));
        }
        if !root.is_leaf() && root.keys.is_empty() {
            return Err(IndexError::corruption("internal root has no keys"));
        }

        let mut level = vec![self.root];
        let mut seen = 0;
        let mut stored = 0;

        while !level.is_empty() {
            let leaf_level = self.nodes[level[0]].is_leaf();
            let mut next = Vec::new();

            for (i, &id) in level.iter().enumerate() {
                let node = self
                    .nodes
                    .get(id)
                    .ok_or_else(|| IndexError::corruption(format!("stale child {}", id)))?;
                seen += 1;

                if node.is_leaf() != leaf_level {
                    return Err(IndexError::corruption(format!(
                        "node {} is at the wrong depth",
                        id
                    )));
                }
                if node.keys.len() >= self.config.degree {
                    return Err(IndexError::corruption(format!(
                        "node {} holds {} keys (degree {})",
                        id,
                        node.keys.len(),
                        self.config.degree
                    )));
                }
                if node.keys.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(IndexError::corruption(format!(
                        "node {} keys are not strictly ascending: {:?}",
                        id, node.keys
                    )));
                }

                let min = self.min_keys(id);
                if id != self.root && node.keys.len() < min {
                    return Err(IndexError::corruption(format!(
                        "node {} holds {} keys, below the minimum of {}",
                        id,
                        node.keys.len(),
                        min
                    )));
                }

                let expected_left = if i > 0 { Some(level[i - 1]) } else { None };
                let expected_right = level.get(i + 1).copied();
                if node.left != expected_left || node.right != expected_right {
                    return Err(IndexError::corruption(format!(
                        "node {} level links {:?}/{:?}, expected {:?}/{:?}",
                        id, node.left, node.right, expected_left, expected_right
                    )));
                }

                if node.is_leaf() {
                    stored += node.keys.len();
                    continue;
                }

                let children = node.children();
                if children.len() != node.keys.len() + 1 {
                    return Err(IndexError::corruption(format!(
                        "node {} has {} keys but {} children",
                        id,
                        node.keys.len(),
                        children.len()
                    )));
                }
                for (idx, &child) in children.iter().enumerate() {
                    let child_node = self
                        .nodes
                        .get(child)
                        .ok_or_else(|| IndexError::corruption(format!("stale child {}", child)))?;
                    if child_node.parent != Some(id) {
                        return Err(IndexError::corruption(format!(
                            "child {} of {} points at parent {:?}",
                            child, id, child_node.parent
                        )));
                    }
                    let lower = if idx > 0 { node.keys.get(idx - 1) } else { None };
                    let upper = node.keys.get(idx);
                    self.check_bounds(child, lower, upper)?;
                }
                next.extend_from_slice(children);
            }

            level = next;
        }

        if seen != self.nodes.len() {
            return Err(IndexError::corruption(format!(
                "{} live nodes but {} reachable",
                self.nodes.len(),
                seen
            )));
        }
        if stored != self.len {
            return Err(IndexError::corruption(format!(
                "{} keys in leaves but length is {}",
                stored, self.len
            )));
        }
        Ok(())
    }

    /// Every key under `id` must satisfy `lower <= key < upper`
    fn check_bounds(&self, id: NodeId, lower: Option<&K>, upper: Option<&K>) -> Result<()> {
        let node = &self.nodes[id];
        for key in &node.keys {
            let above = lower.map_or(true, |l| key >= l);
            let below = upper.map_or(true, |u| key < u);
            if !(above && below) {
                return Err(IndexError::corruption(format!(
                    "key {:?} in node {} escapes separators {:?}..{:?}",
                    key, id, lower, upper
                )));
            }
        }
        for &child in node.children() {
            self.check_bounds(child, lower, upper)?;
        }
        Ok(())
    }
}

impl<K: Ord + Clone + fmt::Debug> fmt::Display for OrderedIndex<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
