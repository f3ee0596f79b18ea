//! Depth-first graph walk with an explicit work stack
//!
//! A container is visited in two steps. `Expand` registers its id and
//! schedules its children; `Finalize` runs once every child has produced an
//! id and builds the record from them. Children are scheduled in reverse so
//! they are expanded left to right, which keeps id assignment in the same
//! order a recursive walk would produce.
//!
//! ```text
//! Expand(list)                     id 1 reserved
//!   ├─ Expand(a)                   id 2, scalar record emitted
//!   ├─ Expand(list)                already seen → 1
//!   └─ Finalize(list, arity 2)     record 1 = [2, 1]
//! ```

use tracing::{debug, trace};

use super::identity::{IdentityTable, Registration};
use super::records::{Payload, ValueRecord};
use super::SerializeError;
use crate::memory::value::{Data, Value};

/// Shape of a container awaiting its record
#[derive(Debug, Clone, Copy)]
enum Container {
    Sequence,
    Set,
    Mapping,
}

enum Task {
    Expand {
        value: Value,
        depth: usize,
    },
    Finalize {
        id: u32,
        type_name: String,
        container: Container,
        arity: usize,
    },
}

/// State owned by one serialization run
pub(crate) struct TraversalState {
    identities: IdentityTable,
    values: Vec<ValueRecord>,
    max_depth: Option<usize>,
    work: Vec<Task>,
    resolved: Vec<u32>, // ids of finished children, consumed by Finalize
}

impl TraversalState {
    pub(crate) fn new(max_depth: Option<usize>) -> Self {
        TraversalState {
            identities: IdentityTable::new(),
            values: Vec::new(),
            max_depth,
            work: Vec::new(),
            resolved: Vec::new(),
        }
    }

    /// Serialize `root` and everything reachable from it, returning its id
    pub(crate) fn visit(&mut self, root: &Value) -> Result<u32, SerializeError> {
        let root_id = self.expand(root.clone(), 0)?;
        while let Some(task) = self.work.pop() {
            match task {
                Task::Expand { value, depth } => {
                    self.expand(value, depth)?;
                }
                Task::Finalize {
                    id,
                    type_name,
                    container,
                    arity,
                } => self.finalize(id, type_name, container, arity),
            }
        }
        self.resolved.clear();
        Ok(root_id)
    }

    pub(crate) fn into_values(self) -> Vec<ValueRecord> {
        self.values
    }

    pub(crate) fn registered(&self) -> usize {
        self.identities.len()
    }

    fn expand(&mut self, value: Value, depth: usize) -> Result<u32, SerializeError> {
        let id = match self.identities.reserve(value.identity()) {
            Registration::Seen(id) => {
                self.resolved.push(id);
                return Ok(id);
            }
            Registration::Reserved(id) => id,
        };

        if let Some(limit) = self.max_depth {
            if depth > limit {
                debug!(limit, id, "nesting depth limit exceeded");
                return Err(SerializeError::DepthLimitExceeded { limit });
            }
        }

        let type_name = value.type_name().to_string();
        trace!(id, type_name = %type_name, depth, "registered object");

        let expanded = match &*value.data() {
            Data::Sequence(items) => Some((Container::Sequence, items.clone())),
            Data::Set(items) => Some((Container::Set, items.clone())),
            Data::Mapping(entries) => Some((
                Container::Mapping,
                entries
                    .iter()
                    .flat_map(|(k, v)| [k.clone(), v.clone()])
                    .collect(),
            )),
            _ => None,
        };

        let Some((container, children)) = expanded else {
            self.values.push(ValueRecord {
                id,
                type_name,
                payload: Payload::Scalar(value),
            });
            self.resolved.push(id);
            return Ok(id);
        };

        self.work.push(Task::Finalize {
            id,
            type_name,
            container,
            arity: children.len(),
        });
        for child in children.into_iter().rev() {
            self.work.push(Task::Expand {
                value: child,
                depth: depth + 1,
            });
        }
        Ok(id)
    }

    fn finalize(&mut self, id: u32, type_name: String, container: Container, arity: usize) {
        let start = self.resolved.len() - arity;
        let child_ids = self.resolved.split_off(start);
        let payload = match container {
            Container::Sequence => Payload::Sequence(child_ids),
            Container::Set => Payload::Set(child_ids),
            Container::Mapping => Payload::Mapping(
                child_ids
                    .chunks_exact(2)
                    .map(|pair| (pair[0], pair[1]))
                    .collect(),
            ),
        };
        self.values.push(ValueRecord {
            id,
            type_name,
            payload,
        });
        self.resolved.push(id);
    }
}
