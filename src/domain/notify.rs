//! State change notifications.

use std::fmt;

use generational_arena::Index;
use serde_json::Value;
use tracing::trace;

use crate::domain::arena::{NodeId, TreeArena};
use crate::domain::state::{CheckState, StateStore};

/// A node whose stored state was just changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateChanged<'a> {
    pub id: &'a NodeId,
    pub record: &'a Value,
    pub state: CheckState,
}

/// Receiver of state change events.
pub trait StateListener {
    fn state_changed(&mut self, event: &StateChanged<'_>);
}

impl<F> StateListener for F
where
    F: FnMut(&StateChanged<'_>),
{
    fn state_changed(&mut self, event: &StateChanged<'_>) {
        self(event)
    }
}

/// Handle returned by [`ChangeNotifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Fan-out of state change events to subscribed listeners.
#[derive(Default)]
pub struct ChangeNotifier {
    listeners: Vec<(SubscriptionId, Box<dyn StateListener>)>,
    next_id: u64,
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl StateListener + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener; returns false if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    pub fn notify(&mut self, event: &StateChanged<'_>) {
        for (_, listener) in &mut self.listeners {
            listener.state_changed(event);
        }
    }

    /// Emits one event per changed handle, reading the committed state.
    pub fn emit_changes(&mut self, tree: &TreeArena, store: &StateStore, changed: &[Index]) -> usize {
        if self.listeners.is_empty() {
            return 0;
        }
        let mut emitted = 0;
        for &idx in changed {
            let (Some(node), Some(state)) = (tree.get_node(idx), store.get(idx)) else {
                continue;
            };
            let event = StateChanged {
                id: &node.data.id,
                record: &node.data.record,
                state,
            };
            trace!(id = %event.id, state = %event.state, "state changed");
            self.notify(&event);
            emitted += 1;
        }
        emitted
    }
}
