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

use crate::error::Error;
use crate::object::{ObjectId, Value};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{class, read_value, write_value};
use crate::types::Tag;

/// Upper bound on capacity reserved from an untrusted length.
const PREALLOC_LIMIT: usize = 1024;

pub(crate) fn write_array(context: &mut WriteContext, id: ObjectId, limit: i32) -> Result<(), Error> {
    let base = context.heap.builtins().array;
    class::write_uclass(context, id, base)?;
    context.write_tag(Tag::Array);
    let this = Value::Object(id);
    let len = context.heap.array(&this).map_or(0, |items| items.len());
    context.writer.write_long(len as i64)?;
    for i in 0..len {
        let item = context
            .heap
            .array(&this)
            .and_then(|items| items.get(i))
            .cloned()
            .ok_or_else(modified)?;
        write_value(context, &item, limit)?;
        if context.heap.array(&this).map_or(0, |items| items.len()) != len {
            return Err(modified());
        }
    }
    Ok(())
}

fn modified() -> Error {
    Error::concurrent_mutation("array modified during dump")
}

pub(crate) fn read_array(context: &mut ReadContext, partial: bool) -> Result<Value, Error> {
    let len = context.reader.read_long()?;
    if len < 0 {
        return Err(Error::invalid_data("negative array size (or size too big)"));
    }
    let len = len as usize;
    context.reader.expect(len);
    let value = context
        .heap
        .array_new(Vec::with_capacity(len.min(PREALLOC_LIMIT)));
    let Value::Object(id) = value else {
        return Err(Error::invalid_data("array allocation failed"));
    };
    context.ref_reader.store(value.clone());
    for _ in 0..len {
        let item = read_value(context)?;
        if let Some(items) = context.heap.array_mut(id) {
            items.push(item);
        }
    }
    context.leave(value, partial)
}
