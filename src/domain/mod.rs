//! Domain layer: tree model, tri-state storage and the cascade algorithm
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod cascade;
pub mod error;
pub mod notify;
pub mod state;

pub use arena::{NodeData, NodeId, TreeArena, TreeNode};
pub use builder::{BuildResult, TreeBuilder};
pub use cascade::{derive_state, CascadeEngine};
pub use error::{DomainError, NotFoundError, TreeResult, ValidationError};
pub use notify::{ChangeNotifier, StateChanged, StateListener, SubscriptionId};
pub use state::{CheckState, StateStore};
