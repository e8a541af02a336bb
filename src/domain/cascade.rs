//! Tri-state propagation over an arena tree.
//!
//! A state change travels down to every descendant and then up towards the
//! root. The upward walk recomputes each ancestor from its direct children
//! and stops at the first ancestor whose value does not change: nothing above
//! it can be affected by the edit.
//!
//! Every walk is iterative, so tree depth is bounded only by memory.

use generational_arena::Index;
use tracing::{debug, instrument, trace};

use crate::domain::arena::{NodeId, TreeArena};
use crate::domain::error::NotFoundError;
use crate::domain::state::{CheckState, StateStore};

/// Derives a parent's state from the states of its direct children.
///
/// `Checked` only if every child is checked, `Unchecked` only if every child
/// is unchecked, `Indeterminate` otherwise. Callers pass at least one child;
/// an empty iterator yields `Indeterminate`.
pub fn derive_state<I>(children: I) -> CheckState
where
    I: IntoIterator<Item = CheckState>,
{
    let mut seen_any = false;
    let mut all_checked = true;
    let mut all_unchecked = true;
    for state in children {
        seen_any = true;
        all_checked &= state == CheckState::Checked;
        all_unchecked &= state == CheckState::Unchecked;
        if !all_checked && !all_unchecked {
            break;
        }
    }

    match (seen_any, all_checked, all_unchecked) {
        (true, true, false) => CheckState::Checked,
        (true, false, true) => CheckState::Unchecked,
        _ => CheckState::Indeterminate,
    }
}

/// Applies state changes to a store, keeping it consistent with the tree.
///
/// Mutating operations return the handles whose stored value actually
/// changed, in the order they were written: origin, descendants in
/// pre-order, then ancestors nearest-first.
pub struct CascadeEngine<'a> {
    tree: &'a TreeArena,
    store: &'a mut StateStore,
}

impl<'a> CascadeEngine<'a> {
    pub fn new(tree: &'a TreeArena, store: &'a mut StateStore) -> Self {
        Self { tree, store }
    }

    /// Sets `id` to `state`, cascading down (when enabled) and deriving up.
    ///
    /// The id is resolved before anything is written, so an unknown id leaves
    /// the store untouched.
    #[instrument(level = "trace", skip(self))]
    pub fn set_node_state(
        &mut self,
        id: &str,
        state: CheckState,
        cascade: bool,
    ) -> Result<Vec<Index>, NotFoundError> {
        let idx = self
            .tree
            .index_of(id)
            .ok_or_else(|| NotFoundError(NodeId::from(id)))?;

        let mut changed = Vec::new();
        if self.store.set(idx, state) != Some(state) {
            changed.push(idx);
        }

        // Indeterminate has no meaning for an explicitly set subtree
        if cascade && state != CheckState::Indeterminate {
            self.cascade_down(idx, state, &mut changed);
        }
        self.propagate_up(idx, &mut changed);

        debug!(%id, %state, cascade, changed = changed.len(), "set node state");
        Ok(changed)
    }

    /// Current derived value for a node with children; `None` for leaves.
    pub fn derive(&self, idx: Index) -> Option<CheckState> {
        let children = self.tree.children_of(idx);
        if children.is_empty() {
            return None;
        }
        Some(derive_state(children.iter().map(|&child| {
            self.store.get(child).unwrap_or(CheckState::Unchecked)
        })))
    }

    /// Bottom-up pass fixing seeded states that contradict their children.
    ///
    /// Post-order visits every child before its parent, so each parent is
    /// derived exactly once from final child values and the pass costs one
    /// look per edge. Leaves keep their seeded values.
    #[instrument(level = "trace", skip(self))]
    pub fn reconcile(&mut self) -> Vec<Index> {
        let tree = self.tree;
        let mut changed = Vec::new();
        for (idx, node) in tree.iter_postorder() {
            if node.children.is_empty() {
                continue;
            }
            if let Some(derived) = self.derive(idx) {
                if self.store.get(idx) != Some(derived) {
                    self.store.set(idx, derived);
                    changed.push(idx);
                }
            }
        }
        debug!(changed = changed.len(), "reconciled seeded states");
        changed
    }

    fn cascade_down(&mut self, idx: Index, state: CheckState, changed: &mut Vec<Index>) {
        let tree = self.tree;
        let descendants = tree.descendants_of(idx).map(|(child, _)| child);
        changed.extend(self.store.set_many(descendants, state));
    }

    fn propagate_up(&mut self, idx: Index, changed: &mut Vec<Index>) {
        let tree = self.tree;
        for ancestor in tree.ancestors_of(idx) {
            let Some(derived) = self.derive(ancestor) else {
                break;
            };
            if self.store.get(ancestor) == Some(derived) {
                trace!(ancestor = ?tree.node_id(ancestor), %derived, "converged");
                break;
            }
            self.store.set(ancestor, derived);
            changed.push(ancestor);
        }
    }
}
