//! Index node layout.

use crate::types::NodeId;

/// Leaf or internal marker, with the child handles of internal nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Leaf: keys are the stored values
    Leaf,
    /// Internal: `children.len() == keys.len() + 1` outside of a split
    Internal { children: Vec<NodeId> },
}

/// A node of the ordered index.
///
/// Keys are strictly ascending. `parent`, `left` and `right` are arena
/// handles; `left`/`right` link the node into the doubly-linked chain of
/// its level, which may cross parent boundaries.
#[derive(Debug, Clone)]
pub struct Node<K> {
    pub(crate) keys: Vec<K>,
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
}

impl<K> Node<K> {
    /// Create an empty leaf
    pub fn new_leaf() -> Self {
        Self::with_kind(NodeKind::Leaf, Vec::new())
    }

    /// Create an internal node over the given children
    pub fn new_internal(keys: Vec<K>, children: Vec<NodeId>) -> Self {
        Self::with_kind(NodeKind::Internal { children }, keys)
    }

    fn with_kind(kind: NodeKind, keys: Vec<K>) -> Self {
        Self {
            keys,
            kind,
            parent: None,
            left: None,
            right: None,
        }
    }

    /// Keys stored in this node
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Whether this is a leaf node
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf)
    }

    /// Child handles (empty for leaves)
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Leaf => &[],
            NodeKind::Internal { children } => children,
        }
    }

    /// Parent handle, `None` for the root
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Left neighbour on the same level
    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    /// Right neighbour on the same level
    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the node holds no keys
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<NodeId> {
        match &mut self.kind {
            NodeKind::Internal { children } => children,
            NodeKind::Leaf => panic!("leaf node has no children"),
        }
    }

    /// Position of `child` among this node's children
    pub(crate) fn child_position(&self, child: NodeId) -> Option<usize> {
        self.children().iter().position(|&c| c == child)
    }
}

impl<K: Ord> Node<K> {
    /// Index of the child whose range covers `key`.
    ///
    /// The first child `i` with `key < keys[i]`, else the last child.
    /// Separators equal to `key` send it right.
    pub fn child_index(&self, key: &K) -> usize {
        self.keys.partition_point(|sep| sep <= key)
    }

    /// Whether `key` is stored in this node
    pub fn contains(&self, key: &K) -> bool {
        self.keys.binary_search(key).is_ok()
    }
}
