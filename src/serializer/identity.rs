//! Identity table
//!
//! Maps object identities to the integer ids used in the output. An id is
//! handed out the first time an object is seen and returned unchanged for
//! every later sighting, which is what lets shared references and cycles
//! collapse onto one record.

use rustc_hash::FxHashMap;

use crate::memory::value::ObjectId;

/// First id handed out in every run
pub const FIRST_VALUE_ID: u32 = 1;

/// Outcome of [`IdentityTable::reserve`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// First sighting; the caller must build the record for this id
    Reserved(u32),
    /// Already registered; nothing more to do
    Seen(u32),
}

#[derive(Debug)]
pub struct IdentityTable {
    ids: FxHashMap<ObjectId, u32>,
    next_id: u32,
}

impl IdentityTable {
    pub fn new() -> Self {
        IdentityTable {
            ids: FxHashMap::default(),
            next_id: FIRST_VALUE_ID,
        }
    }

    pub fn lookup(&self, identity: ObjectId) -> Option<u32> {
        self.ids.get(&identity).copied()
    }

    /// Register `identity` under the next id unless it already has one
    pub fn reserve(&mut self, identity: ObjectId) -> Registration {
        if let Some(id) = self.lookup(identity) {
            return Registration::Seen(id);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.ids.insert(identity, id);
        Registration::Reserved(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Default for IdentityTable {
    fn default() -> Self {
        Self::new()
    }
}
