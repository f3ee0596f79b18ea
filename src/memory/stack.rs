//! Call stack implementation
//!
//! This module provides the call stack that snapshots are collected from:
//! - [`CallStack`]: The stack of frames, rooted at the top-level frame
//! - [`StackFrame`]: A single function's activation record
//!
//! # Top-Level Frame
//!
//! The bottom of every [`CallStack`] is the top-level frame, named
//! [`TOP_LEVEL_FRAME_NAME`]. Besides program data it usually holds imported
//! modules, function and class definitions, and interpreter-private names.
//! [`CallStack::capture`] drops those before handing the bindings over; inner
//! frames are captured as they are.

use rustc_hash::FxHashMap;
use tracing::debug;

use super::value::Value;
use crate::snapshot::{BindingSnapshot, FrameEntry};

/// Name of the frame holding top-level bindings
pub const TOP_LEVEL_FRAME_NAME: &str = "__main__";

/// Top-level names with this prefix are interpreter-private
pub const PRIVATE_NAME_PREFIX: &str = "__";

/// Stack frame for a function call
#[derive(Debug, Clone)]
pub struct StackFrame {
    pub function_name: String,
    locals: FxHashMap<String, Value>,
    insertion_order: Vec<String>, // Order of first binding
}

impl StackFrame {
    pub fn new(function_name: impl Into<String>) -> Self {
        StackFrame {
            function_name: function_name.into(),
            locals: FxHashMap::default(),
            insertion_order: Vec::new(),
        }
    }

    /// Bind a variable; rebinding keeps its original position
    pub fn bind(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        let name = name.into();
        if !self.locals.contains_key(&name) {
            self.insertion_order.push(name.clone());
        }
        self.locals.insert(name, value)
    }

    /// Remove a variable binding
    pub fn unbind(&mut self, name: &str) -> Option<Value> {
        let removed = self.locals.remove(name)?;
        if let Some(pos) = self.insertion_order.iter().position(|x| x == name) {
            self.insertion_order.remove(pos);
        }
        Some(removed)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.locals.get(name)
    }

    pub fn len(&self) -> usize {
        self.insertion_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insertion_order.is_empty()
    }

    /// Bindings in the order they were first made
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.insertion_order
            .iter()
            .filter_map(|name| self.locals.get(name).map(|v| (name.as_str(), v)))
    }

    fn to_entry(&self) -> FrameEntry {
        FrameEntry {
            name: self.function_name.clone(),
            bindings: self
                .bindings()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
        }
    }

    fn to_filtered_entry(&self) -> FrameEntry {
        let mut dropped = 0usize;
        let bindings = self
            .bindings()
            .filter(|(name, value)| {
                let keep = !name.starts_with(PRIVATE_NAME_PREFIX) && value.is_data();
                if !keep {
                    dropped += 1;
                }
                keep
            })
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        debug!(
            frame = %self.function_name,
            dropped,
            "filtered non-data top-level bindings"
        );
        FrameEntry {
            name: self.function_name.clone(),
            bindings,
        }
    }
}

/// The call stack
#[derive(Debug, Clone)]
pub struct CallStack {
    frames: Vec<StackFrame>, // frames[0] is the top-level frame
}

impl CallStack {
    pub fn new() -> Self {
        CallStack {
            frames: vec![StackFrame::new(TOP_LEVEL_FRAME_NAME)],
        }
    }

    /// Push a new stack frame
    pub fn push_frame(&mut self, function_name: impl Into<String>) -> &mut StackFrame {
        self.frames.push(StackFrame::new(function_name));
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Pop the innermost frame; the top-level frame is never popped
    pub fn pop_frame(&mut self) -> Option<StackFrame> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Get the current (innermost) frame
    pub fn current_frame(&self) -> &StackFrame {
        let last = self.frames.len() - 1;
        &self.frames[last]
    }

    pub fn current_frame_mut(&mut self) -> &mut StackFrame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub fn globals(&self) -> &StackFrame {
        &self.frames[0]
    }

    pub fn globals_mut(&mut self) -> &mut StackFrame {
        &mut self.frames[0]
    }

    /// Frames from the top-level frame outward to the innermost call
    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    /// Number of frames, including the top-level frame
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Collect bindings innermost frame first, ending with the filtered
    /// top-level frame
    pub fn capture(&self) -> BindingSnapshot {
        let mut snapshot: BindingSnapshot = self.frames[1..]
            .iter()
            .rev()
            .map(StackFrame::to_entry)
            .collect();
        snapshot.push(self.frames[0].to_filtered_entry());
        snapshot
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new()
    }
}
