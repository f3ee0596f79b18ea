//! Host value representation
//!
//! This module defines [`Value`], a shared handle to a heap object. Several
//! variables and containers may hold handles to the same object; the object's
//! identity is the address of its allocation, not its content.
//!
//! # Object Kinds
//!
//! - [`Data::Scalar`]: `None`, bool, int, float, str
//! - [`Data::Sequence`]: ordered elements (`list`, `tuple`)
//! - [`Data::Set`]: unique elements in insertion order (`set`, `frozenset`)
//! - [`Data::Mapping`]: key/value entries in insertion order (`dict`)
//! - [`Data::Function`], [`Data::Module`], [`Data::Class`]: non-data bindings
//! - [`Data::Opaque`]: any other host object, carried by its textual form
//!
//! # Cycles
//!
//! Containers are mutated through the handle, so a container can be pushed
//! into itself. Such cycles keep their objects alive until broken with
//! [`Value::clear`].

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use super::ValueError;

/// Pointer identity of a heap object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Leaf values
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    fn default_type_name(&self) -> &'static str {
        match self {
            Scalar::None => "NoneType",
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::Str(_) => "str",
        }
    }
}

/// Contents of a heap object
#[derive(Debug, Clone)]
pub enum Data {
    Scalar(Scalar),
    Sequence(Vec<Value>),
    Set(Vec<Value>),
    Mapping(Vec<(Value, Value)>),
    Function(String),
    Module(String),
    Class(String),
    Opaque(String),
}

/// The four structural categories the serializer distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Sequence,
    Set,
    Mapping,
    Scalar,
}

impl Shape {
    pub fn is_container(self) -> bool {
        !matches!(self, Shape::Scalar)
    }

    fn name(self) -> &'static str {
        match self {
            Shape::Sequence => "sequence",
            Shape::Set => "set",
            Shape::Mapping => "mapping",
            Shape::Scalar => "scalar",
        }
    }
}

impl Data {
    /// Classify into one of the four shapes; everything that is not a
    /// container is a scalar.
    pub fn shape(&self) -> Shape {
        match self {
            Data::Sequence(_) => Shape::Sequence,
            Data::Set(_) => Shape::Set,
            Data::Mapping(_) => Shape::Mapping,
            Data::Scalar(_)
            | Data::Function(_)
            | Data::Module(_)
            | Data::Class(_)
            | Data::Opaque(_) => Shape::Scalar,
        }
    }
}

#[derive(Debug)]
struct Object {
    type_name: String,
    data: RefCell<Data>,
}

/// Shared handle to a heap object
///
/// `Clone` copies the handle. Two clones of one handle are the same object.
#[derive(Clone)]
pub struct Value(Rc<Object>);

impl Value {
    fn alloc(type_name: impl Into<String>, data: Data) -> Self {
        Value(Rc::new(Object {
            type_name: type_name.into(),
            data: RefCell::new(data),
        }))
    }

    pub fn scalar(scalar: Scalar) -> Self {
        let type_name = scalar.default_type_name();
        Self::alloc(type_name, Data::Scalar(scalar))
    }

    pub fn none() -> Self {
        Self::scalar(Scalar::None)
    }

    pub fn bool(b: bool) -> Self {
        Self::scalar(Scalar::Bool(b))
    }

    pub fn int(n: i64) -> Self {
        Self::scalar(Scalar::Int(n))
    }

    pub fn float(x: f64) -> Self {
        Self::scalar(Scalar::Float(x))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Self::scalar(Scalar::Str(s.into()))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Self::alloc("list", Data::Sequence(items))
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Self::alloc("tuple", Data::Sequence(items))
    }

    /// Build a set; later elements equal to an earlier one are dropped.
    pub fn set(items: Vec<Value>) -> Self {
        Self::alloc("set", Data::Set(dedup_set(items)))
    }

    pub fn frozenset(items: Vec<Value>) -> Self {
        Self::alloc("frozenset", Data::Set(dedup_set(items)))
    }

    /// Build a mapping; a repeated key overwrites the earlier entry's value.
    pub fn dict(entries: Vec<(Value, Value)>) -> Self {
        let mut merged: Vec<(Value, Value)> = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            upsert(&mut merged, key, value);
        }
        Self::alloc("dict", Data::Mapping(merged))
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self::alloc("function", Data::Function(name.into()))
    }

    pub fn module(name: impl Into<String>) -> Self {
        Self::alloc("module", Data::Module(name.into()))
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::alloc("type", Data::Class(name.into()))
    }

    /// A host object with no structural meaning, known only by its text.
    pub fn opaque(type_name: impl Into<String>, repr: impl Into<String>) -> Self {
        Self::alloc(type_name, Data::Opaque(repr.into()))
    }

    /// Allocate an object with an explicit runtime type name
    pub fn with_type_name(type_name: impl Into<String>, data: Data) -> Self {
        let data = match data {
            Data::Set(items) => Data::Set(dedup_set(items)),
            Data::Mapping(entries) => {
                let mut merged = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    upsert(&mut merged, key, value);
                }
                Data::Mapping(merged)
            }
            other => other,
        };
        Self::alloc(type_name, data)
    }

    pub fn identity(&self) -> ObjectId {
        ObjectId(Rc::as_ptr(&self.0) as *const () as usize)
    }

    pub fn ptr_eq(&self, other: &Value) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn type_name(&self) -> &str {
        &self.0.type_name
    }

    pub fn data(&self) -> Ref<'_, Data> {
        self.0.data.borrow()
    }

    pub fn shape(&self) -> Shape {
        self.data().shape()
    }

    /// Check if this value is program data (not a function, module or class)
    pub fn is_data(&self) -> bool {
        !matches!(
            *self.data(),
            Data::Function(_) | Data::Module(_) | Data::Class(_)
        )
    }

    /// Get the scalar content, returns None for every other kind
    pub fn as_scalar(&self) -> Option<Scalar> {
        match &*self.data() {
            Data::Scalar(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Number of elements (entries for mappings), 0 for scalars
    pub fn len(&self) -> usize {
        match &*self.data() {
            Data::Sequence(items) | Data::Set(items) => items.len(),
            Data::Mapping(entries) => entries.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append to a sequence
    pub fn push(&self, item: Value) -> Result<(), ValueError> {
        match &mut *self.0.data.borrow_mut() {
            Data::Sequence(items) => {
                items.push(item);
                Ok(())
            }
            _ => Err(self.mismatch("push", Shape::Sequence)),
        }
    }

    /// Add to a set, returns false if an equal element was already present
    pub fn add(&self, item: Value) -> Result<bool, ValueError> {
        match &mut *self.0.data.borrow_mut() {
            Data::Set(items) => {
                if items.iter().any(|existing| same_key(existing, &item)) {
                    return Ok(false);
                }
                items.push(item);
                Ok(true)
            }
            _ => Err(self.mismatch("add", Shape::Set)),
        }
    }

    /// Insert into a mapping, returning the value previously bound to `key`
    pub fn insert(&self, key: Value, value: Value) -> Result<Option<Value>, ValueError> {
        match &mut *self.0.data.borrow_mut() {
            Data::Mapping(entries) => Ok(upsert(entries, key, value)),
            _ => Err(self.mismatch("insert", Shape::Mapping)),
        }
    }

    /// Look up a mapping entry by key
    pub fn get(&self, key: &Value) -> Option<Value> {
        match &*self.data() {
            Data::Mapping(entries) => entries
                .iter()
                .find(|(k, _)| same_key(k, key))
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    /// Remove every element of a container, breaking any cycle through it
    pub fn clear(&self) {
        match &mut *self.0.data.borrow_mut() {
            Data::Sequence(items) | Data::Set(items) => items.clear(),
            Data::Mapping(entries) => entries.clear(),
            _ => {}
        }
    }

    fn mismatch(&self, op: &'static str, expected: Shape) -> ValueError {
        ValueError::ShapeMismatch {
            op,
            expected: expected.name(),
            type_name: self.type_name().to_string(),
        }
    }
}

impl fmt::Debug for Value {
    // Identity only: printing contents would recurse forever through cycles.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} at {}>", self.type_name(), self.identity())
    }
}

/// Key equality: containers match only themselves, scalars match by content.
fn same_key(a: &Value, b: &Value) -> bool {
    if a.ptr_eq(b) {
        return true;
    }
    if a.type_name() != b.type_name() {
        return false;
    }
    match (scalar_of(a), scalar_of(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

// A failed borrow means the object is a container being mutated right now.
fn scalar_of(v: &Value) -> Option<Scalar> {
    match &*v.0.data.try_borrow().ok()? {
        Data::Scalar(s) => Some(s.clone()),
        _ => None,
    }
}

fn dedup_set(items: Vec<Value>) -> Vec<Value> {
    let mut unique: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        if !unique.iter().any(|existing| same_key(existing, &item)) {
            unique.push(item);
        }
    }
    unique
}

fn upsert(entries: &mut Vec<(Value, Value)>, key: Value, value: Value) -> Option<Value> {
    match entries.iter_mut().find(|(k, _)| same_key(k, &key)) {
        Some((_, slot)) => Some(std::mem::replace(slot, value)),
        None => {
            entries.push((key, value));
            None
        }
    }
}
