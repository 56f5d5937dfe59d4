// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implementation of the [`CompressionTable`] type.

use std::collections::HashMap;

use arrayvec::ArrayVec;

use super::{Name, MAX_WIRE_LEN};

/// The largest message offset that a compression pointer can encode.
const POINTER_MAX: usize = 0x3fff;

/// Records where domain names were written in a message, so that later
/// names can be compressed with pointers to them ([RFC 1035 § 4.1.4]).
///
/// The table is keyed by the lowercased on-the-wire form of every name
/// suffix written so far, so compression is case-insensitive. It is
/// owned by whoever is encoding the message as a whole; record encoders
/// borrow it mutably while they write.
///
/// Entries can be rolled back to a [`Checkpoint`], which lets an
/// encoder that fails part way through a record forget the names it
/// registered for the region that will not be transmitted.
///
/// [RFC 1035 § 4.1.4]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.4
#[derive(Clone, Debug, Default)]
pub struct CompressionTable {
    offsets: HashMap<Box<[u8]>, u16>,
    insertion_order: Vec<Box<[u8]>>,
}

/// A position in a [`CompressionTable`]'s history, as returned by
/// [`CompressionTable::checkpoint`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Checkpoint(usize);

impl CompressionTable {
    /// Creates an empty `CompressionTable`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of name suffixes recorded in the table.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Returns whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Returns the message offset at which `name` (or a name equal to
    /// it, ignoring case) was previously written, if any.
    pub fn get(&self, name: &Name) -> Option<u16> {
        self.find_suffix(name.wire_repr())
    }

    /// Finds the longest suffix of `name` present in the table. This
    /// returns the number of octets at the start of `name`'s
    /// on-the-wire representation that must be written literally, and
    /// the pointer to write after them (if any).
    pub(crate) fn longest_suffix(&self, name: &Name) -> (usize, Option<u16>) {
        let wire = name.wire_repr();
        name.label_offsets()
            .into_iter()
            .find_map(|offset| {
                self.find_suffix(&wire[offset..])
                    .map(|pointer| (offset, Some(pointer)))
            })
            .unwrap_or((wire.len(), None))
    }

    /// Registers the suffixes of `name` that were written literally,
    /// given that the name starts at message offset `start` and that
    /// its first `literal_len` octets were written without compression.
    /// Suffixes beyond the reach of a pointer are not recorded.
    pub(crate) fn register(&mut self, name: &Name, literal_len: usize, start: usize) {
        let wire = name.wire_repr();
        for offset in name.label_offsets() {
            if offset >= literal_len || start + offset > POINTER_MAX {
                break;
            }
            let key = lowercase(&wire[offset..]);
            if !self.offsets.contains_key(key.as_slice()) {
                let key: Box<[u8]> = key.as_slice().into();
                self.offsets.insert(key.clone(), (start + offset) as u16);
                self.insertion_order.push(key);
            }
        }
    }

    /// Returns a [`Checkpoint`] for the current contents of the table.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.insertion_order.len())
    }

    /// Removes every entry added since `checkpoint` was taken.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        for key in self.insertion_order.drain(checkpoint.0.min(self.insertion_order.len())..) {
            self.offsets.remove(&key);
        }
    }

    /// Looks up an on-the-wire name suffix.
    fn find_suffix(&self, suffix: &[u8]) -> Option<u16> {
        self.offsets.get(lowercase(suffix).as_slice()).copied()
    }
}

/// Lowercases an on-the-wire name (or suffix) without allocating.
fn lowercase(wire: &[u8]) -> ArrayVec<u8, MAX_WIRE_LEN> {
    wire.iter().map(u8::to_ascii_lowercase).collect()
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
