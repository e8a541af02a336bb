//! Public checkbox operations over a built tree.
//!
//! `CheckTree` composes the tree, its state store and the change notifier.
//! The check/uncheck surface is the [`Checkable`] trait, so callers depend on
//! the capability instead of the concrete type.

use std::fmt;
use std::str::FromStr;

use generational_arena::Index;
use serde_json::Value;
use tracing::debug;

use crate::config::Settings;
use crate::domain::arena::TreeIterator;
use crate::domain::{
    CascadeEngine, ChangeNotifier, CheckState, NodeId, NotFoundError, StateListener, StateStore,
    SubscriptionId, TreeArena, TreeResult,
};

/// Tri-state checkbox operations.
pub trait Checkable {
    /// Checks a node, cascading per the configured flag. Returns the number of changed nodes.
    fn check(&mut self, id: &str) -> Result<usize, NotFoundError>;

    /// Unchecks a node, cascading per the configured flag. Returns the number of changed nodes.
    fn uncheck(&mut self, id: &str) -> Result<usize, NotFoundError>;

    fn check_all(&mut self) -> usize;

    fn uncheck_all(&mut self) -> usize;

    /// Ids of checked nodes in depth-first pre-order.
    fn checked_ids(&self) -> CheckedIds<'_>;
}

/// A tree with tri-state selection markers kept consistent on every change.
#[derive(Debug)]
pub struct CheckTree {
    tree: TreeArena,
    store: StateStore,
    notifier: ChangeNotifier,
    cascade: bool,
}

impl CheckTree {
    /// Wraps a built tree and runs the initial reconciliation pass.
    ///
    /// Nodes missing from `store` start out unchecked.
    pub fn new(tree: TreeArena, mut store: StateStore, cascade: bool) -> Self {
        for (idx, _) in tree.iter() {
            if store.get(idx).is_none() {
                store.set(idx, CheckState::Unchecked);
            }
        }
        let reconciled = CascadeEngine::new(&tree, &mut store).reconcile();
        debug!(
            nodes = tree.len(),
            reconciled = reconciled.len(),
            cascade,
            "check tree ready"
        );
        Self {
            tree,
            store,
            notifier: ChangeNotifier::new(),
            cascade,
        }
    }

    /// Builds from nested records using the field names and cascade flag in `settings`.
    pub fn from_records(records: &[Value], settings: &Settings) -> TreeResult<Self> {
        let (tree, store) = settings.tree_builder().build(records)?;
        Ok(Self::new(tree, store, settings.cascade))
    }

    /// Builds from flat parent-linked records.
    pub fn from_flat_records(records: &[Value], settings: &Settings) -> TreeResult<Self> {
        let (tree, store) = settings.tree_builder().build_flat(records)?;
        Ok(Self::new(tree, store, settings.cascade))
    }

    pub fn tree(&self) -> &TreeArena {
        &self.tree
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn cascade_enabled(&self) -> bool {
        self.cascade
    }

    pub fn set_cascade(&mut self, cascade: bool) {
        self.cascade = cascade;
    }

    pub fn subscribe(&mut self, listener: impl StateListener + 'static) -> SubscriptionId {
        self.notifier.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    pub fn state_of(&self, id: &str) -> Result<CheckState, NotFoundError> {
        let idx = self.resolve(id)?;
        Ok(self.store.get(idx).unwrap_or(CheckState::Unchecked))
    }

    pub fn record_of(&self, id: &str) -> Result<&Value, NotFoundError> {
        let idx = self.resolve(id)?;
        self.tree
            .get_node(idx)
            .map(|node| &node.data.record)
            .ok_or_else(|| NotFoundError(NodeId::from(id)))
    }

    pub fn parent_of(&self, id: &str) -> Result<Option<&NodeId>, NotFoundError> {
        let idx = self.resolve(id)?;
        Ok(self
            .tree
            .parent_of(idx)
            .and_then(|parent| self.tree.node_id(parent)))
    }

    pub fn children_of(&self, id: &str) -> Result<Vec<&NodeId>, NotFoundError> {
        let idx = self.resolve(id)?;
        Ok(self
            .tree
            .children_of(idx)
            .iter()
            .filter_map(|&child| self.tree.node_id(child))
            .collect())
    }

    /// Lazy depth-first walk below `id`; clone the iterator to restart it.
    pub fn descendants_of(
        &self,
        id: &str,
    ) -> Result<impl Iterator<Item = &NodeId> + Clone + '_, NotFoundError> {
        let idx = self.resolve(id)?;
        Ok(self
            .tree
            .descendants_of(idx)
            .map(|(_, node)| &node.data.id))
    }

    /// Lazy nearest-first walk from the parent of `id` up to its root.
    pub fn ancestor_chain_of(
        &self,
        id: &str,
    ) -> Result<impl Iterator<Item = &NodeId> + Clone + '_, NotFoundError> {
        let idx = self.resolve(id)?;
        let tree = &self.tree;
        Ok(tree
            .ancestors_of(idx)
            .filter_map(move |ancestor| tree.node_id(ancestor)))
    }

    /// Sets any tri-state value on `id`, cascading per the configured flag.
    pub fn set_node_state(&mut self, id: &str, state: CheckState) -> Result<usize, NotFoundError> {
        let changed = CascadeEngine::new(&self.tree, &mut self.store).set_node_state(
            id,
            state,
            self.cascade,
        )?;
        self.emit(&changed);
        Ok(changed.len())
    }

    pub fn apply(&mut self, operation: &Operation) -> Result<usize, NotFoundError> {
        match operation {
            Operation::Check(id) => self.check(id.as_str()),
            Operation::Uncheck(id) => self.uncheck(id.as_str()),
            Operation::CheckAll => Ok(self.check_all()),
            Operation::UncheckAll => Ok(self.uncheck_all()),
        }
    }

    fn resolve(&self, id: &str) -> Result<Index, NotFoundError> {
        self.tree
            .index_of(id)
            .ok_or_else(|| NotFoundError(NodeId::from(id)))
    }

    fn assign_all(&mut self, state: CheckState) -> usize {
        let changed = self
            .store
            .set_many(self.tree.iter().map(|(idx, _)| idx), state);
        debug!(%state, changed = changed.len(), "assigned all nodes");
        self.emit(&changed);
        changed.len()
    }

    fn emit(&mut self, changed: &[Index]) {
        self.notifier.emit_changes(&self.tree, &self.store, changed);
    }
}

impl Checkable for CheckTree {
    fn check(&mut self, id: &str) -> Result<usize, NotFoundError> {
        self.set_node_state(id, CheckState::Checked)
    }

    fn uncheck(&mut self, id: &str) -> Result<usize, NotFoundError> {
        self.set_node_state(id, CheckState::Unchecked)
    }

    fn check_all(&mut self) -> usize {
        self.assign_all(CheckState::Checked)
    }

    fn uncheck_all(&mut self) -> usize {
        self.assign_all(CheckState::Unchecked)
    }

    fn checked_ids(&self) -> CheckedIds<'_> {
        CheckedIds {
            nodes: self.tree.iter(),
            store: &self.store,
        }
    }
}

/// Checked node ids in pre-order. Cloning restarts from the clone point.
#[derive(Clone)]
pub struct CheckedIds<'a> {
    nodes: TreeIterator<'a>,
    store: &'a StateStore,
}

impl<'a> Iterator for CheckedIds<'a> {
    type Item = &'a NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        self.nodes
            .by_ref()
            .find(|(idx, _)| self.store.get(*idx) == Some(CheckState::Checked))
            .map(|(_, node)| &node.data.id)
    }
}

/// A replayable checkbox command, e.g. `check:42` or `uncheck-all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Check(NodeId),
    Uncheck(NodeId),
    CheckAll,
    UncheckAll,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Check(id) => write!(f, "check:{id}"),
            Self::Uncheck(id) => write!(f, "uncheck:{id}"),
            Self::CheckAll => f.write_str("check-all"),
            Self::UncheckAll => f.write_str("uncheck-all"),
        }
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "check-all" => return Ok(Self::CheckAll),
            "uncheck-all" => return Ok(Self::UncheckAll),
            _ => {}
        }
        let (verb, id) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("invalid operation '{s}' (expected check:<id>, uncheck:<id>, check-all or uncheck-all)"))?;
        if id.is_empty() {
            return Err(format!("operation '{s}' is missing a node id"));
        }
        match verb {
            "check" => Ok(Self::Check(NodeId::from(id))),
            "uncheck" => Ok(Self::Uncheck(NodeId::from(id))),
            other => Err(format!("unknown operation '{other}'")),
        }
    }
}
