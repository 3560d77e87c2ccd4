// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::collections::{HashMap, HashSet};

use crate::buffer::Writer;
use crate::error::Error;
use crate::object::{ClassId, ObjectId, Value};
use crate::types::Tag;

/// Identity under which a dumped value is remembered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Identity {
    Object(ObjectId),
    Class(ClassId),
}

/// Object table of the dump side.
///
/// RefWriter hands out ordinals in the order values are registered, which is
/// the order the loader registers them back. A value met a second time is
/// written as a [`Tag::Link`] to its ordinal instead of being encoded again,
/// which preserves sharing and makes cycles finite.
///
/// # Examples
///
/// ```rust
/// use marshal_core::buffer::Writer;
/// use marshal_core::object::Heap;
/// use marshal_core::resolver::ref_resolver::{Identity, RefWriter};
///
/// let mut heap = Heap::new();
/// let id = heap.array_new(vec![]).as_object().unwrap();
/// let mut ref_writer = RefWriter::new();
/// let mut writer = Writer::default();
///
/// // First encounter - nothing written, the caller encodes the value
/// assert!(!ref_writer.try_write_ref(&mut writer, Identity::Object(id)).unwrap());
/// ref_writer.remember(Identity::Object(id));
///
/// // Second encounter - a link to ordinal 0 is written
/// assert!(ref_writer.try_write_ref(&mut writer, Identity::Object(id)).unwrap());
/// assert_eq!(writer.dump(), vec![b'@', 0x00]);
/// ```
#[derive(Default)]
pub struct RefWriter {
    refs: HashMap<Identity, u32>,
    next_ref_id: u32,
}

impl RefWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a link if `identity` was already registered.
    ///
    /// # Returns
    ///
    /// * `true` if a link was written
    /// * `false` if this is the first occurrence and the value must be encoded
    pub fn try_write_ref(&mut self, writer: &mut Writer, identity: Identity) -> Result<bool, Error> {
        match self.refs.get(&identity) {
            Some(&ref_id) => {
                writer.write_u8(Tag::Link.byte());
                writer.write_long(ref_id as i64)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Registers `identity` under the next ordinal.
    pub fn remember(&mut self, identity: Identity) -> u32 {
        let ref_id = self.skip();
        self.refs.insert(identity, ref_id);
        ref_id
    }

    /// Consumes an ordinal for a value that can never be linked to, such as a
    /// float or an integer widened to a bignum.
    pub fn skip(&mut self) -> u32 {
        let ref_id = self.next_ref_id;
        self.next_ref_id += 1;
        ref_id
    }

    pub fn len(&self) -> usize {
        self.next_ref_id as usize
    }

    pub fn is_empty(&self) -> bool {
        self.next_ref_id == 0
    }

    /// Clear all stored references.
    pub fn clear(&mut self) {
        self.refs.clear();
        self.next_ref_id = 0;
    }
}

/// Object table of the load side.
///
/// Ordinals are assigned as values are registered. A slot is empty while a
/// custom hook is still producing its value, and a registered object stays in
/// the partial set until it is fully built. Links to partial objects are legal
/// and are how cycles load; links to empty slots are not.
///
/// # Examples
///
/// ```rust
/// use marshal_core::object::Value;
/// use marshal_core::resolver::ref_resolver::RefReader;
///
/// let mut ref_reader = RefReader::new();
/// let pending = ref_reader.reserve();
/// assert!(ref_reader.get(pending as i64).is_err());
///
/// ref_reader.fill(pending, Value::Integer(7));
/// assert_eq!(ref_reader.get(0).unwrap(), (Value::Integer(7), false));
/// ```
#[derive(Default)]
pub struct RefReader {
    refs: Vec<Option<Value>>,
    partial: HashSet<ObjectId>,
}

impl RefReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value` under the next ordinal. Objects start out partial.
    ///
    /// # Returns
    ///
    /// The ordinal that links in the input use to refer to `value`
    pub fn store(&mut self, value: Value) -> u32 {
        let ref_id = self.reserve();
        self.fill(ref_id, value);
        ref_id
    }

    /// Takes the next ordinal without a value.
    pub fn reserve(&mut self) -> u32 {
        let ref_id = self.refs.len() as u32;
        self.refs.push(None);
        ref_id
    }

    /// Places `value` into a reserved slot.
    pub fn fill(&mut self, ref_id: u32, value: Value) {
        if let Value::Object(id) = value {
            self.partial.insert(id);
        }
        if let Some(slot) = self.refs.get_mut(ref_id as usize) {
            *slot = Some(value);
        }
    }

    /// Marks an object as fully built.
    pub fn finish(&mut self, id: ObjectId) {
        self.partial.remove(&id);
    }

    pub fn is_partial(&self, id: ObjectId) -> bool {
        self.partial.contains(&id)
    }

    /// Resolves a link.
    ///
    /// # Returns
    ///
    /// The registered value and whether it is still under construction
    pub fn get(&self, ref_id: i64) -> Result<(Value, bool), Error> {
        let slot = usize::try_from(ref_id)
            .ok()
            .and_then(|index| self.refs.get(index))
            .ok_or_else(|| Error::bad_link("dump format error (unlinked)"))?;
        match slot {
            Some(value) => {
                let partial = matches!(value, Value::Object(id) if self.partial.contains(id));
                Ok((value.clone(), partial))
            }
            None => Err(Error::bad_link("dump format error (bad link)")),
        }
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn clear(&mut self) {
        self.refs.clear();
        self.partial.clear();
    }
}
