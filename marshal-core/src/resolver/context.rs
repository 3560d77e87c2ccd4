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

use tracing::trace;

use crate::buffer::{Reader, Writer};
use crate::error::Error;
use crate::marshal::Marshal;
use crate::object::{Heap, ObjectId, Symbol, Value};
use crate::resolver::compat_resolver::{CompatEntry, CompatRegistry};
use crate::resolver::ref_resolver::{RefReader, RefWriter};
use crate::resolver::symbol_resolver::{SymbolReader, SymbolWriter};
use crate::types::Tag;

/// Callback run on every completed value of a load. Its result replaces the value.
pub type PostProc<'p> = dyn FnMut(&mut Heap, Value) -> Result<Value, Error> + 'p;

/// State of one dump call.
pub struct WriteContext<'se> {
    pub writer: Writer,
    pub heap: &'se mut Heap,
    marshal: &'se Marshal,
    pub ref_writer: RefWriter,
    pub symbol_writer: SymbolWriter,
}

impl<'se> WriteContext<'se> {
    pub fn new(marshal: &'se Marshal, heap: &'se mut Heap) -> WriteContext<'se> {
        WriteContext {
            writer: Writer::default(),
            heap,
            marshal,
            ref_writer: RefWriter::new(),
            symbol_writer: SymbolWriter::new(),
        }
    }

    pub fn get_marshal(&self) -> &'se Marshal {
        self.marshal
    }

    pub fn compat(&self) -> &'se CompatRegistry {
        self.marshal.compat_registry()
    }

    #[inline(always)]
    pub fn write_tag(&mut self, tag: Tag) {
        self.writer.write_u8(tag.byte());
    }

    pub fn write_symbol(&mut self, symbol: &Symbol) -> Result<(), Error> {
        self.symbol_writer.write_symbol(&mut self.writer, symbol)
    }
}

/// State of one load call.
pub struct ReadContext<'de, 'bf, 'p> {
    pub reader: Reader<'bf>,
    pub heap: &'de mut Heap,
    marshal: &'de Marshal,
    pub ref_reader: RefReader,
    pub symbol_reader: SymbolReader,
    proc_: Option<&'de mut PostProc<'p>>,
    freeze: bool,
    compat_pending: HashMap<ObjectId, (ObjectId, Arc<CompatEntry>)>,
    max_depth: Option<u32>,
    current_depth: u32,
}

impl<'de, 'bf, 'p> ReadContext<'de, 'bf, 'p> {
    pub fn new(
        marshal: &'de Marshal,
        heap: &'de mut Heap,
        reader: Reader<'bf>,
        proc_: Option<&'de mut PostProc<'p>>,
    ) -> ReadContext<'de, 'bf, 'p> {
        let config = marshal.get_config();
        ReadContext {
            reader,
            heap,
            marshal,
            ref_reader: RefReader::new(),
            symbol_reader: SymbolReader::new(),
            proc_,
            freeze: config.is_freeze(),
            compat_pending: HashMap::new(),
            max_depth: config.max_load_depth(),
            current_depth: 0,
        }
    }

    pub fn get_marshal(&self) -> &'de Marshal {
        self.marshal
    }

    pub fn compat(&self) -> &'de CompatRegistry {
        self.marshal.compat_registry()
    }

    #[inline(always)]
    pub fn inc_depth(&mut self) -> Result<(), Error> {
        self.current_depth += 1;
        if let Some(max_depth) = self.max_depth {
            if self.current_depth > max_depth {
                return Err(Error::depth_exceed(format!(
                    "exceed depth limit (load nesting {} > {})",
                    self.current_depth, max_depth
                )));
            }
        }
        Ok(())
    }

    #[inline(always)]
    pub fn dec_depth(&mut self) {
        self.current_depth = self.current_depth.saturating_sub(1);
    }

    /// Remembers that `old` was decoded in place of `real` and must be
    /// converted once it is complete.
    pub fn defer_compat(&mut self, old: ObjectId, real: ObjectId, entry: Arc<CompatEntry>) {
        self.compat_pending.insert(old, (real, entry));
    }

    fn fixup_compat(&mut self, value: Value) -> Result<Value, Error> {
        let Value::Object(old) = value else {
            return Ok(value);
        };
        match self.compat_pending.remove(&old) {
            Some((real, entry)) => {
                trace!(
                    old_class = %self.heap.class_name(entry.old_class),
                    new_class = %self.heap.class_name(entry.new_class),
                    "compat load"
                );
                entry.load(self.heap, real, old)?;
                Ok(Value::Object(real))
            }
            None => Ok(value),
        }
    }

    /// Runs the user callback, if any.
    pub fn post_proc(&mut self, value: Value) -> Result<Value, Error> {
        match self.proc_.as_mut() {
            Some(proc_) => proc_(&mut *self.heap, value),
            None => Ok(value),
        }
    }

    /// Completes a decoded value.
    ///
    /// Pending compat conversion always runs. Unless `partial` is set, the
    /// value also leaves the partial set, is frozen when requested, and goes
    /// through the user callback.
    pub fn leave(&mut self, value: Value, partial: bool) -> Result<Value, Error> {
        let value = self.fixup_compat(value)?;
        if partial {
            return Ok(value);
        }
        if let Value::Object(id) = value {
            self.ref_reader.finish(id);
            if self.freeze {
                self.heap.freeze(id);
            }
        }
        self.post_proc(value)
    }
}
