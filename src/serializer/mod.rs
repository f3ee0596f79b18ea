//! Graph serializer
//!
//! Turns a [`BindingSnapshot`](crate::snapshot::BindingSnapshot) into a flat
//! list of records that refer to each other by integer id:
//! - [`identity`]: object identity → id table
//! - [`records`]: frame and value record types
//! - `traversal`: the cycle-safe, post-order graph walk
//!
//! # Guarantees
//!
//! - Every reachable object gets exactly one id and one value record.
//! - Ids start at [`identity::FIRST_VALUE_ID`] and follow first-sighting order.
//! - An object's id is registered before its children are visited, so a
//!   container that reaches itself sees its own id instead of looping.
//! - Frame records come first, in input order; value records follow in the
//!   order they were completed (children before parents).
//!
//! No state survives a call: each run owns a fresh identity table.

pub mod identity;
pub mod records;
mod traversal;

use thiserror::Error;
use tracing::debug;

use crate::snapshot::FrameEntry;
use records::{FrameRecord, Records};
use traversal::TraversalState;

/// Errors from a serialization run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializeError {
    /// Containers were nested deeper than [`SerializerOptions::max_depth`]
    #[error("container nesting exceeds the depth limit of {limit}")]
    DepthLimitExceeded { limit: usize },
}

/// Serializer configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializerOptions {
    /// Deepest allowed container nesting below a variable binding; a bound
    /// value is at depth 0. `None` walks any depth.
    pub max_depth: Option<usize>,
}

impl SerializerOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Serializer {
    options: SerializerOptions,
}

impl Serializer {
    pub fn new(options: SerializerOptions) -> Self {
        Serializer { options }
    }

    pub fn options(&self) -> &SerializerOptions {
        &self.options
    }

    /// Serialize every binding of every frame
    pub fn serialize(&self, snapshot: &[FrameEntry]) -> Result<Records, SerializeError> {
        debug!(
            frames = snapshot.len(),
            max_depth = ?self.options.max_depth,
            "serializing snapshot"
        );

        let mut state = TraversalState::new(self.options.max_depth);
        let mut frames = Vec::with_capacity(snapshot.len());

        for entry in snapshot {
            let mut variables = Vec::with_capacity(entry.bindings.len());
            for (name, value) in &entry.bindings {
                let id = state.visit(value)?;
                variables.push((name.clone(), id));
            }
            frames.push(FrameRecord {
                name: entry.name.clone(),
                variables,
            });
        }

        let objects = state.registered();
        let records = Records::new(frames, state.into_values());
        debug!(objects, records = records.len(), "snapshot serialized");
        Ok(records)
    }
}

/// Serialize with default options
pub fn serialize(snapshot: &[FrameEntry]) -> Result<Records, SerializeError> {
    Serializer::default().serialize(snapshot)
}
