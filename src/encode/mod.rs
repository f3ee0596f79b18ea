//! JSON encoding of serialized snapshots
//!
//! The record list is written as one JSON array. Two key layouts are
//! supported:
//!
//! ```text
//! Layout::Records    {"isFrame": true, "name": "f", "variables": {"x": 1}}
//!                    {"id": 1, "isContainer": true, "typeName": "list", "payload": [2, 3]}
//!
//! Layout::MemoryViz  {"isClass": true, "name": "f", "id": null, "value": {"x": 1}, "stack_frame": true}
//!                    {"isClass": false, "name": "list", "id": 1, "value": [2, 3]}
//! ```
//!
//! Mapping payloads become JSON objects keyed by the key's id. Scalar payloads
//! are rendered here, not by the serializer, so a function, module, class or
//! opaque object only fails once it reaches this module.

use std::io;

use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::memory::value::{Data, Scalar, Value};
use crate::serializer::records::{FrameRecord, Payload, Record, Records, ValueRecord};

/// Key layout of the emitted JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    #[default]
    Records,
    MemoryViz,
}

#[derive(Debug, Error)]
pub enum EncodeError {
    /// A scalar payload has no JSON rendering
    #[error("value record {id} of type '{type_name}' cannot be encoded")]
    Unrepresentable { id: u32, type_name: String },

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn to_json(records: &Records, layout: Layout) -> Result<String, EncodeError> {
    check_scalars(records)?;
    Ok(serde_json::to_string(&RecordsView { records, layout })?)
}

pub fn to_json_pretty(records: &Records, layout: Layout) -> Result<String, EncodeError> {
    check_scalars(records)?;
    Ok(serde_json::to_string_pretty(&RecordsView {
        records,
        layout,
    })?)
}

pub fn to_writer<W: io::Write>(
    writer: W,
    records: &Records,
    layout: Layout,
) -> Result<(), EncodeError> {
    check_scalars(records)?;
    serde_json::to_writer(writer, &RecordsView { records, layout })?;
    Ok(())
}

// Fail before anything is written so a writer never receives half an array.
fn check_scalars(records: &Records) -> Result<(), EncodeError> {
    for record in records.values() {
        if let Payload::Scalar(value) = &record.payload {
            if !is_representable(value) {
                return Err(EncodeError::Unrepresentable {
                    id: record.id,
                    type_name: record.type_name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn is_representable(value: &Value) -> bool {
    matches!(*value.data(), Data::Scalar(_))
}

struct RecordsView<'a> {
    records: &'a Records,
    layout: Layout,
}

impl Serialize for RecordsView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.records.len()))?;
        for record in self.records {
            match record {
                Record::Frame(frame) => seq.serialize_element(&FrameView {
                    frame,
                    layout: self.layout,
                })?,
                Record::Value(value) => seq.serialize_element(&ValueView {
                    record: value,
                    layout: self.layout,
                })?,
            }
        }
        seq.end()
    }
}

struct FrameView<'a> {
    frame: &'a FrameRecord,
    layout: Layout,
}

impl Serialize for FrameView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let variables = VariablesView(&self.frame.variables);
        match self.layout {
            Layout::Records => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("isFrame", &true)?;
                map.serialize_entry("name", &self.frame.name)?;
                map.serialize_entry("variables", &variables)?;
                map.end()
            }
            Layout::MemoryViz => {
                let mut map = serializer.serialize_map(Some(5))?;
                map.serialize_entry("isClass", &true)?;
                map.serialize_entry("name", &self.frame.name)?;
                map.serialize_entry("id", &None::<u32>)?;
                map.serialize_entry("value", &variables)?;
                map.serialize_entry("stack_frame", &true)?;
                map.end()
            }
        }
    }
}

struct VariablesView<'a>(&'a [(String, u32)]);

impl Serialize for VariablesView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, id) in self.0 {
            map.serialize_entry(name, id)?;
        }
        map.end()
    }
}

struct ValueView<'a> {
    record: &'a ValueRecord,
    layout: Layout,
}

impl Serialize for ValueView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let record = self.record;
        let payload = PayloadView(&record.payload);
        match self.layout {
            Layout::Records => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("id", &record.id)?;
                map.serialize_entry("isContainer", &record.is_container())?;
                map.serialize_entry("typeName", &record.type_name)?;
                map.serialize_entry("payload", &payload)?;
                map.end()
            }
            Layout::MemoryViz => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("isClass", &false)?;
                map.serialize_entry("name", &record.type_name)?;
                map.serialize_entry("id", &record.id)?;
                map.serialize_entry("value", &payload)?;
                map.end()
            }
        }
    }
}

struct PayloadView<'a>(&'a Payload);

impl Serialize for PayloadView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Payload::Sequence(ids) | Payload::Set(ids) => ids.serialize(serializer),
            Payload::Mapping(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (key_id, value_id) in pairs {
                    map.serialize_entry(&key_id.to_string(), value_id)?;
                }
                map.end()
            }
            Payload::Scalar(value) => match &*value.data() {
                Data::Scalar(scalar) => serialize_scalar(scalar, serializer),
                _ => Err(S::Error::custom(format!(
                    "cannot encode value of type '{}'",
                    value.type_name()
                ))),
            },
        }
    }
}

fn serialize_scalar<S: Serializer>(scalar: &Scalar, serializer: S) -> Result<S::Ok, S::Error> {
    match scalar {
        Scalar::None => serializer.serialize_none(),
        Scalar::Bool(b) => serializer.serialize_bool(*b),
        Scalar::Int(n) => serializer.serialize_i64(*n),
        Scalar::Float(x) if x.is_finite() => serializer.serialize_f64(*x),
        Scalar::Float(_) => serializer.serialize_none(),
        Scalar::Str(s) => serializer.serialize_str(s),
    }
}
