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

//! # Marshal Core
//!
//! Binary object-graph serialization in the Ruby Marshal 4.8 format.
//!
//! Values live in a [`Heap`](object::Heap): heap objects are addressed by
//! [`ObjectId`](object::ObjectId), classes and modules by
//! [`ClassId`](object::ClassId), and immediates (nil, booleans, small
//! integers, floats, symbols) are carried inline in a
//! [`Value`](object::Value). A dump walks the graph from one root value and
//! writes every reachable object once; later occurrences become back
//! references, so shared and cyclic structure survives a round trip.
//!
//! ## Architecture
//!
//! - **`marshal`**: the [`Marshal`] engine and its dump/load entry points
//! - **`buffer`**: byte writer and reader, including the packed integer codec
//! - **`serializer`**: per-shape encoding and decoding
//! - **`resolver`**: back-reference and symbol tables, compat registry, call contexts
//! - **`object`**: the heap, class table and class hooks
//! - **`types`**: wire tags and format constants
//! - **`config`**: engine options
//! - **`error`**: error type and constructors
//!
//! ## Usage
//!
//! ```rust
//! use marshal_core::{Heap, Marshal, Value};
//!
//! let marshal = Marshal::default();
//! let mut heap = Heap::new();
//! let name = heap.str_new("shared");
//! let list = heap.array_new(vec![Value::Integer(1), name.clone(), name]);
//!
//! let bytes = marshal.dump(&mut heap, &list).unwrap();
//! assert_eq!(&bytes[..2], &[4, 8]);
//!
//! let mut other = Heap::new();
//! let loaded = marshal.load(&mut other, &bytes).unwrap();
//! let items = other.array(&loaded).unwrap();
//! assert_eq!(items[0], Value::Integer(1));
//! // Both elements are the same string object again.
//! assert_eq!(items[1], items[2]);
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod marshal;
pub mod object;
pub mod resolver;
pub mod serializer;
pub mod types;

pub use crate::config::Config;
pub use crate::error::Error;
pub use crate::marshal::{Loaded, Marshal, Warning};
pub use crate::object::{
    Builtin, ClassId, CustomMarshal, DataMarshal, Encoding, Heap, ObjectId, Symbol, UserMarshal,
    Value,
};
pub use crate::resolver::compat_resolver::CompatRegistry;
pub use crate::resolver::context::PostProc;
