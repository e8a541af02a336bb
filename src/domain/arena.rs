use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

/// Stable identifier of a node, unique across the whole forest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Data payload for tree nodes.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Identifier taken from the source record
    pub id: NodeId,
    /// Source record without its children field
    pub record: Value,
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for root nodes
    pub parent: Option<Index>,
    /// Indices of child nodes in display order
    pub children: Vec<Index>,
}

/// Arena-based forest of record nodes.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
/// Nodes are only ever added; a changed source means building a new arena.
#[derive(Debug, Default)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    /// Root nodes in display order
    roots: Vec<Index>,
    ids: HashMap<NodeId, Index>,
}

impl TreeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node as the last child of `parent`, or as the last root.
    ///
    /// Id uniqueness is the caller's responsibility; `TreeBuilder` checks it.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let id = data.id.clone();
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.roots.push(node_idx);
        }
        self.ids.insert(id, node_idx);

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    /// Looks up the arena handle of a node by id.
    pub fn index_of(&self, id: &str) -> Option<Index> {
        self.ids.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    pub fn node_id(&self, idx: Index) -> Option<&NodeId> {
        self.get_node(idx).map(|node| &node.data.id)
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn parent_of(&self, idx: Index) -> Option<Index> {
        self.get_node(idx).and_then(|node| node.parent)
    }

    /// Direct children in display order; empty for leaves and unknown handles.
    pub fn children_of(&self, idx: Index) -> &[Index] {
        self.get_node(idx)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_leaf(&self, idx: Index) -> bool {
        self.children_of(idx).is_empty()
    }

    /// Depth-first pre-order walk over the whole forest.
    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, &self.roots)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Every node below `idx`, depth-first pre-order, excluding `idx` itself.
    pub fn descendants_of(&self, idx: Index) -> TreeIterator<'_> {
        TreeIterator::new(self, self.children_of(idx))
    }

    /// Parent, grandparent, ... up to the root.
    pub fn ancestors_of(&self, idx: Index) -> Ancestors<'_> {
        Ancestors {
            arena: self,
            current: self.parent_of(idx),
        }
    }

    /// Number of levels of the deepest root-to-leaf path.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        // Iterative so that degenerate chains cannot exhaust the call stack.
        let mut max_depth = 0;
        let mut stack: Vec<(Index, usize)> = self.roots.iter().map(|&root| (root, 1)).collect();
        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            for &child in self.children_of(idx) {
                stack.push((child, depth + 1));
            }
        }
        max_depth
    }

    /// Collects the ids of all leaf nodes in pre-order.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<&NodeId> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| &node.data.id)
            .collect()
    }
}

#[derive(Clone)]
pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena, start: &[Index]) -> Self {
        // Reversed so that the first entry is popped first
        let stack = start.iter().rev().copied().collect();
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

#[derive(Clone)]
pub struct PostOrderIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let stack = arena.roots.iter().rev().map(|&root| (root, false)).collect();
        Self { arena, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

/// Nearest-first walk from a node's parent up to its root.
#[derive(Clone)]
pub struct Ancestors<'a> {
    arena: &'a TreeArena,
    current: Option<Index>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = Index;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.current?;
        self.current = self.arena.parent_of(idx);
        Some(idx)
    }
}
