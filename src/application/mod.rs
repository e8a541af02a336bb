//! Application layer: the checkbox tree service and record loading
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod check_tree;
pub mod error;
pub mod error_ext;
pub mod services;

pub use check_tree::{CheckTree, Checkable, CheckedIds, Operation};
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
