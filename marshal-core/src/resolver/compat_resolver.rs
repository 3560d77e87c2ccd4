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

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Error;
use crate::object::{ClassId, Heap, ObjectId};

/// Converts an instance of the new class into an instance of the old class.
pub type CompatDumper = dyn Fn(&mut Heap, ObjectId) -> Result<ObjectId, Error> + Send + Sync;

/// Fills the new-class instance (first) from the decoded old-class instance (second).
pub type CompatLoader = dyn Fn(&mut Heap, ObjectId, ObjectId) -> Result<(), Error> + Send + Sync;

/// One registered class rename.
pub struct CompatEntry {
    pub new_class: ClassId,
    pub old_class: ClassId,
    pub(crate) dumper: Arc<CompatDumper>,
    pub(crate) loader: Arc<CompatLoader>,
}

impl CompatEntry {
    pub fn dump(&self, heap: &mut Heap, real: ObjectId) -> Result<ObjectId, Error> {
        (self.dumper)(heap, real)
    }

    pub fn load(&self, heap: &mut Heap, real: ObjectId, old: ObjectId) -> Result<(), Error> {
        (self.loader)(heap, real, old)
    }
}

/// Table of class renames applied to plain objects.
///
/// Dumping an instance of a registered new class writes the old-class
/// instance its dumper returns, so the stream names the old class. Loading a
/// stream that names the old class builds the old-class instance, then hands
/// it to the loader together with a fresh new-class instance and returns the
/// latter. The registry is built up front and shared read-only by every call
/// of the engine that holds it.
///
/// Class handles are heap-local, so a registry only applies to the heap its
/// classes were defined in.
#[derive(Default, Clone)]
pub struct CompatRegistry {
    by_new: HashMap<ClassId, Arc<CompatEntry>>,
    by_old: HashMap<ClassId, Arc<CompatEntry>>,
}

impl CompatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rename from `old_class` to `new_class`.
    ///
    /// # Errors
    ///
    /// A class can take part in at most one rename on each side.
    pub fn define<D, L>(
        &mut self,
        new_class: ClassId,
        old_class: ClassId,
        dumper: D,
        loader: L,
    ) -> Result<&mut Self, Error>
    where
        D: Fn(&mut Heap, ObjectId) -> Result<ObjectId, Error> + Send + Sync + 'static,
        L: Fn(&mut Heap, ObjectId, ObjectId) -> Result<(), Error> + Send + Sync + 'static,
    {
        if self.by_new.contains_key(&new_class) || self.by_old.contains_key(&old_class) {
            return Err(Error::invalid_data("class already has a compat entry"));
        }
        let entry = Arc::new(CompatEntry {
            new_class,
            old_class,
            dumper: Arc::new(dumper),
            loader: Arc::new(loader),
        });
        self.by_new.insert(new_class, entry.clone());
        self.by_old.insert(old_class, entry);
        Ok(self)
    }

    /// Entry converting instances of `class` on dump.
    pub fn for_new(&self, class: ClassId) -> Option<&Arc<CompatEntry>> {
        self.by_new.get(&class)
    }

    /// Entry converting instances of `class` on load.
    pub fn for_old(&self, class: ClassId) -> Option<&Arc<CompatEntry>> {
        self.by_old.get(&class)
    }

    pub fn is_empty(&self) -> bool {
        self.by_new.is_empty()
    }
}
