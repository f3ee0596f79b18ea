// Output records

use rustc_hash::{FxHashMap, FxHashSet};

use crate::memory::value::Value;

/// Contents of a value record
#[derive(Debug, Clone)]
pub enum Payload {
    /// Child ids in element order
    Sequence(Vec<u32>),
    /// Child ids in the set's iteration order
    Set(Vec<u32>),
    /// (key id, value id) pairs in entry order
    Mapping(Vec<(u32, u32)>),
    /// The leaf object itself, rendered by the encoder
    Scalar(Value),
}

impl Payload {
    /// Ids this payload refers to, in payload order
    pub fn child_ids(&self) -> Vec<u32> {
        match self {
            Payload::Sequence(ids) | Payload::Set(ids) => ids.clone(),
            Payload::Mapping(pairs) => pairs.iter().flat_map(|&(k, v)| [k, v]).collect(),
            Payload::Scalar(_) => Vec::new(),
        }
    }
}

/// One distinct object
#[derive(Debug, Clone)]
pub struct ValueRecord {
    pub id: u32,
    pub type_name: String,
    pub payload: Payload,
}

impl ValueRecord {
    pub fn is_container(&self) -> bool {
        !matches!(self.payload, Payload::Scalar(_))
    }
}

/// One call frame; variables map to value ids in binding order
#[derive(Debug, Clone)]
pub struct FrameRecord {
    pub name: String,
    pub variables: Vec<(String, u32)>,
}

impl FrameRecord {
    pub fn variable(&self, name: &str) -> Option<u32> {
        self.variables
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, id)| id)
    }
}

#[derive(Debug, Clone)]
pub enum Record {
    Frame(FrameRecord),
    Value(ValueRecord),
}

impl Record {
    pub fn is_frame(&self) -> bool {
        matches!(self, Record::Frame(_))
    }

    pub fn as_frame(&self) -> Option<&FrameRecord> {
        match self {
            Record::Frame(frame) => Some(frame),
            Record::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&ValueRecord> {
        match self {
            Record::Value(value) => Some(value),
            Record::Frame(_) => None,
        }
    }
}

/// The serialized snapshot: frame records first, then value records in
/// completion order
#[derive(Debug, Clone)]
pub struct Records {
    records: Vec<Record>,
    frame_count: usize,
    by_id: FxHashMap<u32, usize>,
}

impl Records {
    pub(crate) fn new(frames: Vec<FrameRecord>, values: Vec<ValueRecord>) -> Self {
        let frame_count = frames.len();
        let by_id = values
            .iter()
            .enumerate()
            .map(|(i, v)| (v.id, frame_count + i))
            .collect();
        let records = frames
            .into_iter()
            .map(Record::Frame)
            .chain(values.into_iter().map(Record::Value))
            .collect();
        Records {
            records,
            frame_count,
            by_id,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn frames(&self) -> impl Iterator<Item = &FrameRecord> + '_ {
        self.records[..self.frame_count]
            .iter()
            .filter_map(Record::as_frame)
    }

    pub fn values(&self) -> impl Iterator<Item = &ValueRecord> + '_ {
        self.records[self.frame_count..]
            .iter()
            .filter_map(Record::as_value)
    }

    pub fn frame(&self, name: &str) -> Option<&FrameRecord> {
        self.frames().find(|f| f.name == name)
    }

    /// Resolve a value record by id
    pub fn value(&self, id: u32) -> Option<&ValueRecord> {
        self.by_id
            .get(&id)
            .and_then(|&index| self.records[index].as_value())
    }

    /// Every id referenced from a frame variable or a container payload
    pub fn referenced_ids(&self) -> FxHashSet<u32> {
        let from_frames = self
            .frames()
            .flat_map(|f| f.variables.iter().map(|&(_, id)| id));
        let from_values = self.values().flat_map(|v| v.payload.child_ids());
        from_frames.chain(from_values).collect()
    }

    /// Referenced ids with no value record, sorted ascending
    pub fn dangling_ids(&self) -> Vec<u32> {
        let mut dangling: Vec<u32> = self
            .referenced_ids()
            .into_iter()
            .filter(|id| !self.by_id.contains_key(id))
            .collect();
        dangling.sort_unstable();
        dangling
    }

    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    pub fn into_vec(self) -> Vec<Record> {
        self.records
    }
}

impl<'a> IntoIterator for &'a Records {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
