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

//! # Marshal
//!
//! Serializes object graphs into the Ruby Marshal 4.8 binary format and
//! reads them back.
//!
//! The graph is held in a [`Heap`]. Everything reachable from the dumped
//! value is written, with each heap object emitted once: a second encounter
//! writes a back reference instead, so shared substructure and cycles are
//! reproduced exactly on load.
//!
//! ## Quick start
//!
//! ```rust
//! use marshal::{Heap, Value};
//!
//! # fn main() -> Result<(), marshal::Error> {
//! let mut heap = Heap::new();
//! let point = heap.define_struct("Point", &["x", "y"]);
//! let origin = heap.struct_new(point, vec![Value::Integer(0), Value::Integer(0)])?;
//! let list = heap.array_new(vec![origin]);
//! // Close a cycle: the array contains itself.
//! if let Some(id) = list.as_object() {
//!     heap.array_mut(id).unwrap().push(list.clone());
//! }
//!
//! let bytes = marshal::dump(&mut heap, &list, -1)?;
//!
//! let mut other = Heap::new();
//! other.define_struct("Point", &["x", "y"]);
//! let loaded = marshal::load(&mut other, &bytes, None, false)?;
//! let items = other.array(&loaded).unwrap();
//! assert_eq!(items[1], loaded);
//! assert_eq!(other.struct_get(&items[0], "x"), Some(&Value::Integer(0)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Class hooks
//!
//! Classes take over their own encoding by registering a [`CustomMarshal`],
//! [`UserMarshal`] or [`DataMarshal`] on the heap. Classes that were renamed
//! or reshaped between versions can be bridged with a [`CompatRegistry`]
//! passed to [`Marshal::compat`].
//!
//! ## Errors
//!
//! Every failure is an [`Error`]. Setting `MARSHAL_PANIC_ON_ERROR=1` at build
//! time makes error construction panic, which gives a backtrace at the point
//! the error was raised.

pub use marshal_core::buffer::{Reader, Writer};
pub use marshal_core::config::Config;
pub use marshal_core::error::Error;
pub use marshal_core::marshal::{Loaded, Marshal, Warning};
pub use marshal_core::object::{
    Builtin, ClassHooks, ClassId, CustomMarshal, DataMarshal, Encoding, Heap, ObjectId, Payload,
    RClass, RHash, RObject, RRegexp, RString, Symbol, UserMarshal, Value,
};
pub use marshal_core::resolver::compat_resolver::{CompatEntry, CompatRegistry};
pub use marshal_core::resolver::context::PostProc;
pub use marshal_core::types::{Tag, MARSHAL_MAJOR, MARSHAL_MINOR};

/// Dumps `value` and everything reachable from it.
///
/// A negative `depth_limit` never runs out; otherwise nesting deeper than
/// `depth_limit` heap values fails with [`Error::DepthExceed`].
pub fn dump(heap: &mut Heap, value: &Value, depth_limit: i32) -> Result<Vec<u8>, Error> {
    Marshal::default().dump_with_limit(heap, value, depth_limit)
}

/// Loads one value from `bytes` into `heap`.
///
/// `on_each_value` runs on every completed value, innermost first, and its
/// result replaces that value. With `deep_freeze` every loaded object is
/// frozen before the callback sees it.
pub fn load(
    heap: &mut Heap,
    bytes: &[u8],
    on_each_value: Option<&mut PostProc<'_>>,
    deep_freeze: bool,
) -> Result<Value, Error> {
    let marshal = Marshal::default().freeze(deep_freeze);
    Ok(marshal.load_report(heap, bytes, on_each_value)?.value)
}
