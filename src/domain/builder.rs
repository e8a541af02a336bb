//! Tree builder turning source records into an arena and its seeded states.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::arena::{NodeData, NodeId, TreeArena};
use crate::domain::error::ValidationError;
use crate::domain::state::{CheckState, StateStore};

/// Result type for tree construction.
pub type BuildResult<T> = Result<T, ValidationError>;

struct PendingRecord {
    record: Value,
    checked: bool,
}

/// Constructs a forest from nested or flat (parent-linked) records.
///
/// Both layouts are first normalized into a parent → children relationship
/// cache; a single iterative pass then inserts the nodes depth-first.
pub struct TreeBuilder {
    id_field: String,
    checked_field: String,
    children_field: String,
    parent_field: String,
    relationship_cache: HashMap<NodeId, Vec<NodeId>>,
    records: HashMap<NodeId, PendingRecord>,
    root_ids: Vec<NodeId>,
    input_order: Vec<NodeId>,
    visited_ids: HashSet<NodeId>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            id_field: "id".to_string(),
            checked_field: "checked".to_string(),
            children_field: "children".to_string(),
            parent_field: "parentId".to_string(),
            relationship_cache: HashMap::new(),
            records: HashMap::new(),
            root_ids: Vec::new(),
            input_order: Vec::new(),
            visited_ids: HashSet::new(),
        }
    }

    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    pub fn with_checked_field(mut self, field: impl Into<String>) -> Self {
        self.checked_field = field.into();
        self
    }

    pub fn with_children_field(mut self, field: impl Into<String>) -> Self {
        self.children_field = field.into();
        self
    }

    pub fn with_parent_field(mut self, field: impl Into<String>) -> Self {
        self.parent_field = field.into();
        self
    }

    /// Build from root records that nest their children under the children field.
    pub fn build(&mut self, records: &[Value]) -> BuildResult<(TreeArena, StateStore)> {
        self.reset();
        self.scan_nested(records)?;
        self.build_tree()
    }

    /// Build from a flat list where each record names its parent id.
    ///
    /// Records without a parent (missing or null) are roots, in input order.
    pub fn build_flat(&mut self, records: &[Value]) -> BuildResult<(TreeArena, StateStore)> {
        self.reset();
        self.scan_flat(records)?;

        // Records but no root: every parent chain loops
        if self.root_ids.is_empty() {
            if let Some(first) = self.input_order.first() {
                return Err(ValidationError::CycleDetected(first.clone()));
            }
        }

        self.build_tree()
    }

    fn reset(&mut self) {
        self.relationship_cache.clear();
        self.records.clear();
        self.root_ids.clear();
        self.input_order.clear();
        self.visited_ids.clear();
    }

    fn scan_nested(&mut self, records: &[Value]) -> BuildResult<()> {
        // Error paths are rendered on demand from (parent segment, position) links
        let children_field = self.children_field.clone();
        let mut segments: Vec<(Option<usize>, usize)> = Vec::new();
        let mut stack = Vec::new();
        for (pos, record) in records.iter().enumerate() {
            segments.push((None, pos));
            let segment = segments.len() - 1;
            let path = || render_path(&segments, segment, &children_field);
            let id = self.register(record, &path)?;
            self.root_ids.push(id.clone());
            stack.push((record, id, segment));
        }

        while let Some((record, id, parent_segment)) = stack.pop() {
            let children = self.child_records(record, &id)?;
            for (pos, child) in children.iter().enumerate() {
                segments.push((Some(parent_segment), pos));
                let segment = segments.len() - 1;
                let path = || render_path(&segments, segment, &children_field);
                let child_id = self.register(child, &path)?;
                self.relationship_cache
                    .entry(id.clone())
                    .or_default()
                    .push(child_id.clone());
                stack.push((child, child_id, segment));
            }
        }
        Ok(())
    }

    fn scan_flat(&mut self, records: &[Value]) -> BuildResult<()> {
        let mut links = Vec::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            let id = self.register(record, &|| format!("/{pos}"))?;
            let parent = parse_id(record.get(&self.parent_field)).map_err(|_| {
                ValidationError::InvalidField {
                    id: id.clone(),
                    field: self.parent_field.clone(),
                    expected: "a string, a number or null",
                }
            })?;
            links.push((id, parent));
        }

        // Parents may appear after their children, so link only once all ids are known
        for (id, parent) in links {
            match parent {
                None => self.root_ids.push(id),
                Some(parent) => {
                    if !self.records.contains_key(&parent) {
                        return Err(ValidationError::UnknownParent { id, parent });
                    }
                    self.relationship_cache.entry(parent).or_default().push(id);
                }
            }
        }
        Ok(())
    }

    /// Validates a record and stores its payload, returning its id.
    fn register(&mut self, record: &Value, path: &dyn Fn() -> String) -> BuildResult<NodeId> {
        let object = record
            .as_object()
            .ok_or_else(|| ValidationError::NotAnObject { path: path() })?;

        let id = match parse_id(object.get(&self.id_field)) {
            Ok(Some(id)) => id,
            Ok(None) => {
                return Err(ValidationError::MissingId {
                    path: path(),
                    field: self.id_field.clone(),
                })
            }
            Err(()) => return Err(ValidationError::InvalidId { path: path() }),
        };

        let checked = match object.get(&self.checked_field) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(checked)) => *checked,
            Some(_) => {
                return Err(ValidationError::InvalidField {
                    id,
                    field: self.checked_field.clone(),
                    expected: "a boolean",
                })
            }
        };

        if self.records.contains_key(&id) {
            return Err(ValidationError::DuplicateId(id));
        }

        let payload: Map<String, Value> = object
            .iter()
            .filter(|(key, _)| **key != self.children_field)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        self.input_order.push(id.clone());
        self.records.insert(
            id.clone(),
            PendingRecord {
                record: Value::Object(payload),
                checked,
            },
        );
        Ok(id)
    }

    fn child_records<'v>(&self, record: &'v Value, id: &NodeId) -> BuildResult<&'v [Value]> {
        match record.get(&self.children_field) {
            None | Some(Value::Null) => Ok(&[][..]),
            Some(Value::Array(children)) => Ok(children.as_slice()),
            Some(_) => Err(ValidationError::InvalidField {
                id: id.clone(),
                field: self.children_field.clone(),
                expected: "an array",
            }),
        }
    }

    fn build_tree(&mut self) -> BuildResult<(TreeArena, StateStore)> {
        let mut tree = TreeArena::new();
        let mut store = StateStore::with_capacity(self.records.len());
        let roots = std::mem::take(&mut self.root_ids);

        for root in roots {
            let mut stack = vec![(root, None)];

            while let Some((current_id, parent_idx)) = stack.pop() {
                // Cycle detection
                if !self.visited_ids.insert(current_id.clone()) {
                    return Err(ValidationError::CycleDetected(current_id));
                }
                let pending = self
                    .records
                    .remove(&current_id)
                    .ok_or_else(|| ValidationError::CycleDetected(current_id.clone()))?;

                let node_data = NodeData {
                    id: current_id.clone(),
                    record: pending.record,
                };
                let current_idx = tree.insert_node(node_data, parent_idx);
                store.set(current_idx, CheckState::from_seed(pending.checked));

                // Reversed so the first child is inserted first
                if let Some(children) = self.relationship_cache.get(&current_id) {
                    for child in children.iter().rev() {
                        stack.push((child.clone(), Some(current_idx)));
                    }
                }
            }
        }

        // Flat records whose parent chain loops never hang off a root
        if let Some(orphan) = self
            .input_order
            .iter()
            .find(|id| !self.visited_ids.contains(*id))
        {
            return Err(ValidationError::CycleDetected(orphan.clone()));
        }

        debug!(
            nodes = tree.len(),
            roots = tree.roots().len(),
            "built tree"
        );
        Ok((tree, store))
    }
}

/// JSON pointer of a nested record, e.g. `/0/children/1`.
fn render_path(
    segments: &[(Option<usize>, usize)],
    segment: usize,
    children_field: &str,
) -> String {
    let mut positions = Vec::new();
    let mut current = Some(segment);
    while let Some(idx) = current {
        let (parent, pos) = segments[idx];
        positions.push(pos);
        current = parent;
    }
    let joined = positions.iter().rev().join(&format!("/{children_field}/"));
    format!("/{joined}")
}

/// Reads an id-like value: strings verbatim, numbers in decimal form.
fn parse_id(value: Option<&Value>) -> Result<Option<NodeId>, ()> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) => Ok(Some(NodeId::from(id.as_str()))),
        Some(Value::Number(id)) => Ok(Some(NodeId::from(id.to_string()))),
        Some(_) => Err(()),
    }
}
