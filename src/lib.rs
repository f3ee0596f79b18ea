//! # Introduction
//!
//! framegraph captures the variable bindings of a live call stack and turns
//! them into a flat list of records that refer to each other by integer id,
//! ready to be drawn as a memory diagram.
//!
//! ## Pipeline
//!
//! ```text
//! CallStack → BindingSnapshot → Serializer → Records → JSON
//! ```
//!
//! 1. [`memory`] — the host object model: shared [`memory::value::Value`]
//!    handles with pointer identity, and a [`memory::stack::CallStack`] of
//!    frames holding ordered bindings.
//! 2. [`snapshot`] — [`snapshot::FrameEntry`] lists produced by
//!    [`memory::stack::CallStack::capture`], innermost frame first.
//! 3. [`serializer`] — walks the object graph once, giving every distinct
//!    object one id and one record. Shared references and cycles collapse
//!    onto the same id.
//! 4. [`encode`] — writes the records as a JSON array.
//!
//! ## Example
//!
//! ```
//! use framegraph::memory::stack::CallStack;
//! use framegraph::memory::value::Value;
//!
//! let mut stack = CallStack::new();
//! let frame = stack.push_frame("f");
//! let xs = Value::list(vec![Value::int(1), Value::int(2)]);
//! frame.bind("x", xs.clone());
//! frame.bind("y", xs);
//!
//! let records = framegraph::serialize(&stack.capture()).unwrap();
//! let f = records.frame("f").unwrap();
//! assert_eq!(f.variable("x"), f.variable("y"));
//! ```

pub mod encode;
pub mod memory;
pub mod serializer;
pub mod snapshot;

pub use serializer::{serialize, SerializeError, Serializer, SerializerOptions};
