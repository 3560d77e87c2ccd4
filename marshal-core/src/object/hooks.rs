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

//! Per-class serialization hooks.
//!
//! A class can take over its own encoding in three ways. The dumper looks for
//! them in this order, and the first one present wins:
//!
//! - [`CustomMarshal`] turns the object into any other value (`U` tag). The
//!   loader allocates an empty instance and hands it the value back.
//! - [`UserMarshal`] turns the object into a byte string (`u` tag). The loader
//!   builds the instance from the string through the class.
//! - [`DataMarshal`] is required for opaque data objects (`d` tag).

use std::fmt;
use std::sync::Arc;

use super::{ClassId, Heap, ObjectId, Value};
use crate::error::Error;
use crate::marshal::Marshal;

pub trait CustomMarshal: Send + Sync {
    /// Returns the value written in place of `this`.
    fn marshal_dump(&self, marshal: &Marshal, heap: &mut Heap, this: ObjectId)
        -> Result<Value, Error>;

    /// Restores the freshly allocated `this` from the loaded value.
    fn marshal_load(
        &self,
        marshal: &Marshal,
        heap: &mut Heap,
        this: ObjectId,
        data: Value,
    ) -> Result<(), Error>;
}

pub trait UserMarshal: Send + Sync {
    /// Returns a string object holding the encoded form of `this`.
    ///
    /// `limit` is the remaining depth budget of the enclosing dump.
    fn dump(
        &self,
        marshal: &Marshal,
        heap: &mut Heap,
        this: ObjectId,
        limit: i32,
    ) -> Result<Value, Error>;

    /// Builds an instance of `class` from the loaded string object.
    fn load(
        &self,
        marshal: &Marshal,
        heap: &mut Heap,
        class: ClassId,
        data: ObjectId,
    ) -> Result<Value, Error>;
}

pub trait DataMarshal: Send + Sync {
    fn dump_data(&self, marshal: &Marshal, heap: &mut Heap, this: ObjectId)
        -> Result<Value, Error>;

    fn load_data(
        &self,
        marshal: &Marshal,
        heap: &mut Heap,
        this: ObjectId,
        data: Value,
    ) -> Result<(), Error>;
}

#[derive(Clone, Default)]
pub struct ClassHooks {
    pub custom: Option<Arc<dyn CustomMarshal>>,
    pub user: Option<Arc<dyn UserMarshal>>,
    pub data: Option<Arc<dyn DataMarshal>>,
}

impl fmt::Debug for ClassHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassHooks")
            .field("custom", &self.custom.is_some())
            .field("user", &self.user.is_some())
            .field("data", &self.data.is_some())
            .finish()
    }
}
