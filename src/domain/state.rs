//! Tri-state values and their per-node storage.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use generational_arena::Index;
use serde::{Deserialize, Serialize};

/// Selection marker of a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Checked,
    Unchecked,
    /// Some but not all children are checked
    Indeterminate,
}

impl CheckState {
    /// Initial state for a record's boolean checked field.
    pub fn from_seed(checked: bool) -> Self {
        if checked {
            Self::Checked
        } else {
            Self::Unchecked
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Checked => "checked",
            Self::Unchecked => "unchecked",
            Self::Indeterminate => "indeterminate",
        }
    }
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checked" => Ok(Self::Checked),
            "unchecked" => Ok(Self::Unchecked),
            "indeterminate" => Ok(Self::Indeterminate),
            other => Err(format!(
                "unknown state '{other}' (expected checked, unchecked or indeterminate)"
            )),
        }
    }
}

/// Node handle to state mapping.
///
/// A plain key-value layer: it neither knows the tree shape nor enforces
/// any consistency between parents and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateStore {
    states: HashMap<Index, CheckState>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            states: HashMap::with_capacity(capacity),
        }
    }

    pub fn get(&self, idx: Index) -> Option<CheckState> {
        self.states.get(&idx).copied()
    }

    /// Stores `state` and returns the value it replaced.
    pub fn set(&mut self, idx: Index, state: CheckState) -> Option<CheckState> {
        self.states.insert(idx, state)
    }

    /// Stores `state` for every handle, returning those whose value changed.
    pub fn set_many<I>(&mut self, indices: I, state: CheckState) -> Vec<Index>
    where
        I: IntoIterator<Item = Index>,
    {
        indices
            .into_iter()
            .filter(|&idx| self.set(idx, state) != Some(state))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Index, CheckState)> + '_ {
        self.states.iter().map(|(&idx, &state)| (idx, state))
    }
}
