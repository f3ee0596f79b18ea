//! Host memory model
//!
//! This module provides the object graph and call stack that snapshots are
//! taken from:
//! - [`value`]: Shared object handles ([`value::Value`]) with pointer identity
//! - [`stack`]: Call stack of frames holding ordered variable bindings
//!
//! # Identity
//!
//! Two handles refer to the same object exactly when they were cloned from
//! one another. Objects with equal contents allocated separately are distinct:
//!
//! ```text
//! a = [1]; b = a      →  one object, two handles
//! a = [1]; b = [1]    →  two objects
//! ```

pub mod stack;
pub mod value;

use thiserror::Error;

/// Errors raised when mutating objects
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// A container operation was applied to an object of another shape
    #[error("cannot {op} on '{type_name}': expected a {expected}")]
    ShapeMismatch {
        op: &'static str,
        expected: &'static str,
        type_name: String,
    },
}
