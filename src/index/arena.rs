//! Arena storage for index nodes.
//!
//! Nodes live in a growable table and refer to each other by [`NodeId`].
//! Freed slots go on a free list and are handed out again by the next
//! allocation.

use crate::index::node::Node;
use crate::types::NodeId;
use std::ops::{Index, IndexMut};

/// Table of nodes addressed by handle
#[derive(Debug, Clone)]
pub struct NodeArena<K> {
    /// Node slots; `None` marks a freed slot
    slots: Vec<Option<Node<K>>>,
    /// Free list of slot indices
    free_slots: Vec<usize>,
}

impl<K> NodeArena<K> {
    /// Create an empty arena
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_slots: Vec::new(),
        }
    }

    /// Store a node and return its handle
    pub fn alloc(&mut self, node: Node<K>) -> NodeId {
        if let Some(pos) = self.free_slots.pop() {
            self.slots[pos] = Some(node);
            Self::handle(pos)
        } else {
            let pos = self.slots.len();
            let id = Self::handle(pos);
            self.slots.push(Some(node));
            id
        }
    }

    /// Handle for a slot index; handles are 32 bits wide
    fn handle(pos: usize) -> NodeId {
        match u32::try_from(pos) {
            Ok(pos) => NodeId::new(pos),
            Err(_) => panic!("node arena exhausted: slot {} does not fit a handle", pos),
        }
    }

    /// Remove a node, invalidating its handle
    pub fn free(&mut self, id: NodeId) -> Option<Node<K>> {
        let node = self.slots.get_mut(id.index())?.take()?;
        self.free_slots.push(id.index());
        Some(node)
    }

    /// Look up a live node
    pub fn get(&self, id: NodeId) -> Option<&Node<K>> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Look up a live node mutably
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<K>> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_slots.len()
    }

    /// Whether the arena holds no live nodes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over live nodes with their handles
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node<K>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(pos, slot)| slot.as_ref().map(|n| (Self::handle(pos), n)))
    }
}

impl<K> Default for NodeArena<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Index<NodeId> for NodeArena<K> {
    type Output = Node<K>;

    fn index(&self, id: NodeId) -> &Node<K> {
        match self.get(id) {
            Some(node) => node,
            None => panic!("stale node handle {}", id),
        }
    }
}

impl<K> IndexMut<NodeId> for NodeArena<K> {
    fn index_mut(&mut self, id: NodeId) -> &mut Node<K> {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("stale node handle {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_alloc_and_get() {
        let mut arena: NodeArena<i32> = NodeArena::new();
        assert!(arena.is_empty());

        let a = arena.alloc(Node::new_leaf());
        let b = arena.alloc(Node::new_leaf());
        assert_ne!(a, b);
        assert_eq!(arena.len(), 2);

        arena[b].keys.push(9);
        assert_eq!(arena[b].keys(), &[9]);
        assert!(arena[a].is_empty());
    }

    #[test]
    fn test_arena_free_reuses_slot() {
        let mut arena: NodeArena<i32> = NodeArena::new();
        let a = arena.alloc(Node::new_leaf());
        let b = arena.alloc(Node::new_leaf());

        assert!(arena.free(a).is_some());
        assert!(arena.get(a).is_none());
        assert!(arena.free(a).is_none());
        assert_eq!(arena.len(), 1);

        let c = arena.alloc(Node::new_leaf());
        assert_eq!(c, a);
        assert_eq!(arena.iter().count(), 2);
        assert!(arena.get(b).is_some());
    }

    #[test]
    #[should_panic(expected = "stale node handle")]
    fn test_arena_stale_handle_panics() {
        let mut arena: NodeArena<i32> = NodeArena::new();
        let a = arena.alloc(Node::new_leaf());
        arena.free(a);
        let _ = &arena[a];
    }

    #[test]
    fn test_handle_matches_slot() {
        assert_eq!(NodeArena::<i32>::handle(0), NodeId::new(0));
        assert_eq!(NodeArena::<i32>::handle(u32::MAX as usize), NodeId::new(u32::MAX));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    #[should_panic(expected = "node arena exhausted")]
    fn test_handle_rejects_slot_past_u32() {
        NodeArena::<i32>::handle(u32::MAX as usize + 1);
    }
}
