// Binding snapshots handed from the collector to the serializer

use crate::memory::value::Value;

/// One level of the call chain with its variable bindings in binding order
#[derive(Debug, Clone)]
pub struct FrameEntry {
    pub name: String,
    pub bindings: Vec<(String, Value)>,
}

impl FrameEntry {
    pub fn new(name: impl Into<String>) -> Self {
        FrameEntry {
            name: name.into(),
            bindings: Vec::new(),
        }
    }

    /// Bind a variable; rebinding replaces the value and keeps its position
    pub fn bind(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        match self.bindings.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.bindings.push((name, value)),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Frames innermost first; the last entry holds the filtered top-level bindings
pub type BindingSnapshot = Vec<FrameEntry>;
