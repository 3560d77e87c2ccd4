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

use tracing::trace;

use crate::error::Error;
use crate::object::{Builtin, ObjectId, Value};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{class, ivar};
use crate::types::Tag;

/// Swaps in the legacy representation when the object's class has a compat
/// entry. The returned object is what gets written.
pub(crate) fn compat_dump(context: &mut WriteContext, id: ObjectId) -> Result<ObjectId, Error> {
    let class = context.heap.get(id).class();
    match context.compat().for_new(class) {
        Some(entry) => {
            let old = entry.dump(context.heap, id)?;
            trace!(
                new_class = %context.heap.class_name(entry.new_class),
                old_class = %context.heap.class_name(entry.old_class),
                "compat dump"
            );
            Ok(old)
        }
        None => Ok(id),
    }
}

pub(crate) fn write_plain(context: &mut WriteContext, id: ObjectId, limit: i32) -> Result<(), Error> {
    class::write_class_name(context, Tag::Object, id, true)?;
    let count = ivar::dumpable_count(context.heap, id);
    context.writer.write_long(count as i64)?;
    ivar::write_ivar_pairs(context, id, count, limit)
}

/// `o`: a plain object. A class registered as the old side of a compat
/// entry is decoded into a scratch object and converted on completion; the
/// ordinal goes to the converted object.
pub(crate) fn read_object(context: &mut ReadContext, partial: bool) -> Result<Value, Error> {
    let class = class::read_class_name(context)?;
    let (old, real) = match context.compat().for_old(class) {
        Some(entry) => {
            let old = context.heap.allocate(class)?;
            let real = context.heap.allocate(entry.new_class)?;
            context.defer_compat(old, real, entry.clone());
            (old, real)
        }
        None => {
            if context.heap.class(class).builtin() != Builtin::Object {
                return Err(Error::invalid_data(format!(
                    "dump format error ({} is not a plain object class)",
                    context.heap.class_name(class)
                )));
            }
            let id = context.heap.allocate(class)?;
            (id, id)
        }
    };
    context.ref_reader.store(Value::Object(real));
    let value = Value::Object(old);
    ivar::read_ivars(context, &value)?;
    context.leave(value, partial)
}
