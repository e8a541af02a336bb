//! checktree: tri-state checkbox cascade over a tree of JSON records
//!
//! Layers, innermost first:
//! - `domain`: arena tree, state store, cascade engine and change events
//! - `application`: the [`CheckTree`](application::CheckTree) service and record loading
//! - `infrastructure`: filesystem boundary and service wiring
//! - `cli`: argument parsing, command dispatch and output

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;

pub use application::{CheckTree, Checkable, Operation};
pub use config::Settings;
pub use domain::{CheckState, NodeId, StateChanged};
