//! Rendering of checkbox trees via `termtree`.

use std::collections::HashMap;

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::application::CheckTree;
use crate::domain::{CheckState, TreeNode};

pub trait TreeNodeConvert {
    /// One rendered tree per root, in source order.
    fn to_tree_string(&self) -> Vec<Tree<String>>;
}

/// Checkbox marker shown in front of a node label.
pub fn marker(state: CheckState) -> &'static str {
    match state {
        CheckState::Checked => "[x]",
        CheckState::Unchecked => "[ ]",
        CheckState::Indeterminate => "[-]",
    }
}

fn label(node: &TreeNode, state: CheckState) -> String {
    match node.data.record.get("text").and_then(|text| text.as_str()) {
        Some(text) => format!("{} {} {}", marker(state), node.data.id, text),
        None => format!("{} {}", marker(state), node.data.id),
    }
}

/// Deepest level rendered; `termtree` displays and drops trees recursively.
pub const MAX_RENDER_DEPTH: usize = 512;

impl TreeNodeConvert for CheckTree {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Vec<Tree<String>> {
        let tree = self.tree();

        let mut levels: HashMap<Index, usize> = HashMap::with_capacity(tree.len());
        let mut stack: Vec<(Index, usize)> =
            tree.roots().iter().map(|&root| (root, 1)).collect();
        while let Some((idx, level)) = stack.pop() {
            levels.insert(idx, level);
            if level < MAX_RENDER_DEPTH {
                stack.extend(tree.children_of(idx).iter().map(|&child| (child, level + 1)));
            }
        }

        // Post-order hands us every child before its parent
        let mut built: HashMap<Index, Tree<String>> = HashMap::with_capacity(levels.len());
        for (idx, node) in tree.iter_postorder() {
            let Some(&level) = levels.get(&idx) else {
                continue;
            };
            let state = self.store().get(idx).unwrap_or(CheckState::Unchecked);
            let mut rendered = Tree::new(label(node, state));
            if level == MAX_RENDER_DEPTH && !node.children.is_empty() {
                let hidden = tree.descendants_of(idx).count();
                rendered.push(Tree::new(format!("... {hidden} more nodes below")));
            } else {
                let leaves: Vec<_> = node
                    .children
                    .iter()
                    .filter_map(|child| built.remove(child))
                    .collect();
                rendered = rendered.with_leaves(leaves);
            }
            built.insert(idx, rendered);
        }

        tree.roots()
            .iter()
            .filter_map(|root| built.remove(root))
            .collect()
    }
}
