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

use std::cell::Cell;
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::buffer::Reader;
use crate::config::Config;
use crate::ensure;
use crate::error::Error;
use crate::object::{Heap, Value};
use crate::resolver::compat_resolver::CompatRegistry;
use crate::resolver::context::{PostProc, ReadContext, WriteContext};
use crate::serializer;
use crate::types::{MARSHAL_MAJOR, MARSHAL_MINOR};

/// Non-fatal condition met while loading.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Warning {
    /// The stream declares a newer minor version than this engine writes.
    NewerMinorVersion { major: u8, minor: u8 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::NewerMinorVersion { major, minor } => write!(
                f,
                "incompatible marshal file format (can be read)\n\tformat version {}.{} required; {}.{} given",
                MARSHAL_MAJOR, MARSHAL_MINOR, major, minor
            ),
        }
    }
}

/// Result of [`Marshal::load_report`].
#[derive(Debug)]
pub struct Loaded {
    pub value: Value,
    pub warnings: Vec<Warning>,
}

/// Marks an engine busy for the duration of one call.
struct CallGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> CallGuard<'a> {
    fn enter(flag: &'a Cell<bool>, name: &str) -> Result<CallGuard<'a>, Error> {
        if flag.replace(true) {
            return Err(Error::reentered(format!("Marshal.{} reentered", name)));
        }
        Ok(CallGuard { flag })
    }
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// The dump/load engine.
///
/// `Marshal` turns a value graph held in a [`Heap`] into a byte stream and
/// back. Sharing and cycles survive the trip: an object reached twice is
/// written once and linked afterwards, and loads back as a single object.
///
/// Every call builds its own registries, so nothing carries over between
/// calls. A hook that calls back into the engine running it is rejected with
/// [`Error::Reentered`]; hooks that need a nested dump should use a clone.
///
/// # Examples
///
/// ```rust
/// use marshal_core::marshal::Marshal;
/// use marshal_core::object::{Heap, Value};
///
/// let mut heap = Heap::new();
/// let name = heap.str_new("marshal");
/// let list = heap.array_new(vec![Value::Integer(1), name.clone(), name]);
///
/// let marshal = Marshal::default();
/// let bytes = marshal.dump(&mut heap, &list).unwrap();
/// let loaded = marshal.load(&mut heap, &bytes).unwrap();
/// assert!(heap.deep_eq(&list, &loaded));
/// ```
///
/// Custom configuration:
///
/// ```rust
/// use marshal_core::marshal::Marshal;
///
/// let marshal = Marshal::default()
///     .depth_limit(16)
///     .max_load_depth(64)
///     .strict_version(true);
/// ```
pub struct Marshal {
    config: Config,
    compat: Arc<CompatRegistry>,
    dumping: Cell<bool>,
    loading: Cell<bool>,
}

impl Default for Marshal {
    fn default() -> Self {
        Marshal {
            config: Config::default(),
            compat: Arc::new(CompatRegistry::default()),
            dumping: Cell::new(false),
            loading: Cell::new(false),
        }
    }
}

impl Clone for Marshal {
    /// Copies the configuration. The clone is idle even if `self` is mid-call.
    fn clone(&self) -> Self {
        Marshal {
            config: self.config.clone(),
            compat: self.compat.clone(),
            dumping: Cell::new(false),
            loading: Cell::new(false),
        }
    }
}

impl Marshal {
    pub fn new(config: Config) -> Self {
        Marshal {
            config,
            ..Marshal::default()
        }
    }

    /// Sets the default dump depth limit.
    ///
    /// # Arguments
    ///
    /// * `depth_limit` - Number of nested heap values [`Marshal::dump`] may
    ///   descend through. Negative means unlimited.
    ///
    /// # Default
    ///
    /// The default value is `-1`.
    pub fn depth_limit(mut self, depth_limit: i32) -> Self {
        self.config.depth_limit = depth_limit;
        self
    }

    /// Bounds tag nesting while loading untrusted input.
    ///
    /// # Default
    ///
    /// Unlimited.
    pub fn max_load_depth(mut self, max_load_depth: u32) -> Self {
        self.config.max_load_depth = Some(max_load_depth);
        self
    }

    /// Rejects streams whose minor version differs from the current one.
    ///
    /// # Default
    ///
    /// The default value is `false`: older minors load silently and newer
    /// minors load with a [`Warning::NewerMinorVersion`].
    pub fn strict_version(mut self, strict_version: bool) -> Self {
        self.config.strict_version = strict_version;
        self
    }

    /// Freezes every object produced by a load.
    pub fn freeze(mut self, freeze: bool) -> Self {
        self.config.freeze = freeze;
        self
    }

    /// Installs the class rename table used by dump and load.
    pub fn compat(mut self, compat: Arc<CompatRegistry>) -> Self {
        self.compat = compat;
        self
    }

    pub fn get_config(&self) -> &Config {
        &self.config
    }

    pub fn compat_registry(&self) -> &CompatRegistry {
        &self.compat
    }

    /// Dumps `value` with the configured depth limit.
    pub fn dump(&self, heap: &mut Heap, value: &Value) -> Result<Vec<u8>, Error> {
        self.dump_with_limit(heap, value, self.config.depth_limit())
    }

    /// Dumps `value`, failing with [`Error::DepthExceed`] once more than
    /// `limit` nested heap values are entered.
    ///
    /// # Errors
    ///
    /// Any error aborts the whole dump; no bytes are returned.
    pub fn dump_with_limit(
        &self,
        heap: &mut Heap,
        value: &Value,
        limit: i32,
    ) -> Result<Vec<u8>, Error> {
        let _guard = CallGuard::enter(&self.dumping, "dump")?;
        debug!(limit, "marshal dump");
        let mut context = WriteContext::new(self, heap);
        context.writer.write_u8(MARSHAL_MAJOR);
        context.writer.write_u8(MARSHAL_MINOR);
        serializer::write_value(&mut context, value, limit)?;
        trace!(
            bytes = context.writer.len(),
            objects = context.ref_writer.len(),
            "marshal dump finished"
        );
        Ok(context.writer.into_inner())
    }

    /// Dumps `value` and writes the bytes to `out`.
    ///
    /// Nothing is written unless the dump succeeds.
    pub fn dump_to<W: Write>(&self, heap: &mut Heap, value: &Value, out: &mut W) -> Result<(), Error> {
        let bytes = self.dump(heap, value)?;
        out.write_all(&bytes)?;
        Ok(())
    }

    /// Loads one value from `bf`. Trailing bytes are ignored.
    pub fn load(&self, heap: &mut Heap, bf: &[u8]) -> Result<Value, Error> {
        Ok(self.load_report(heap, bf, None)?.value)
    }

    /// Loads one value, calling `proc_` on every completed value.
    ///
    /// The callback sees values bottom-up, after freezing, and whatever it
    /// returns takes the place of the value it was given.
    pub fn load_with(
        &self,
        heap: &mut Heap,
        bf: &[u8],
        proc_: &mut PostProc<'_>,
    ) -> Result<Value, Error> {
        Ok(self.load_report(heap, bf, Some(proc_))?.value)
    }

    /// Loads one value and returns it together with any warnings raised.
    pub fn load_report(
        &self,
        heap: &mut Heap,
        bf: &[u8],
        proc_: Option<&mut PostProc<'_>>,
    ) -> Result<Loaded, Error> {
        self.load_inner(heap, Reader::new(bf), proc_)
    }

    /// Loads one value from a byte stream.
    ///
    /// Exactly the bytes of one dump are consumed, so consecutive dumps
    /// written to the same stream can be loaded one after another. After an
    /// error the stream position is unspecified.
    pub fn load_from<R: Read>(&self, heap: &mut Heap, src: &mut R) -> Result<Value, Error> {
        Ok(self.load_inner(heap, Reader::from_stream(src), None)?.value)
    }

    fn load_inner(
        &self,
        heap: &mut Heap,
        mut reader: Reader<'_>,
        proc_: Option<&mut PostProc<'_>>,
    ) -> Result<Loaded, Error> {
        let _guard = CallGuard::enter(&self.loading, "load")?;
        let warnings = self.read_head(&mut reader)?;
        debug!(stream = reader.is_stream(), "marshal load");
        let mut context = ReadContext::new(self, heap, reader, proc_);
        let value = serializer::read_value(&mut context)?;
        trace!(objects = context.ref_reader.len(), "marshal load finished");
        Ok(Loaded { value, warnings })
    }

    fn read_head(&self, reader: &mut Reader) -> Result<Vec<Warning>, Error> {
        let major = reader.read_u8()?;
        let minor = reader.read_u8()?;
        ensure!(
            major == MARSHAL_MAJOR && (!self.config.is_strict_version() || minor == MARSHAL_MINOR),
            Error::format_version(format!(
                "incompatible marshal file format (can't be read)\n\tformat version {}.{} required; {}.{} given",
                MARSHAL_MAJOR, MARSHAL_MINOR, major, minor
            ))
        );
        let mut warnings = Vec::new();
        if minor > MARSHAL_MINOR {
            let warning = Warning::NewerMinorVersion { major, minor };
            warn!("{}", warning);
            warnings.push(warning);
        } else if minor < MARSHAL_MINOR {
            debug!(major, minor, "loading older marshal minor version");
        }
        Ok(warnings)
    }
}
