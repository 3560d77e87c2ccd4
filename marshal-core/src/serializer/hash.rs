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

pub(crate) fn write_hash(context: &mut WriteContext, id: ObjectId, limit: i32) -> Result<(), Error> {
    let this = Value::Object(id);
    let (len, default) = match context.heap.hash(&this) {
        Some(hash) if hash.default_proc => {
            return Err(Error::unsupported("can't dump hash with default proc"))
        }
        Some(hash) => (hash.len(), hash.default.clone()),
        None => return Err(Error::invalid_data("hash payload expected")),
    };
    let base = context.heap.builtins().hash;
    class::write_uclass(context, id, base)?;
    let has_default = default != Value::Nil;
    context.write_tag(if has_default { Tag::HashDef } else { Tag::Hash });
    context.writer.write_long(len as i64)?;
    for i in 0..len {
        let (key, value) = context
            .heap
            .hash(&this)
            .and_then(|hash| hash.entries.get(i))
            .cloned()
            .ok_or_else(modified)?;
        write_value(context, &key, limit)?;
        write_value(context, &value, limit)?;
        if context.heap.hash(&this).map_or(0, |hash| hash.len()) != len {
            return Err(modified());
        }
    }
    if has_default {
        write_value(context, &default, limit)?;
    }
    Ok(())
}

fn modified() -> Error {
    Error::concurrent_mutation("hash modified during dump")
}

pub(crate) fn read_hash(
    context: &mut ReadContext,
    partial: bool,
    has_default: bool,
) -> Result<Value, Error> {
    let len = context.reader.read_long()?;
    if len < 0 {
        return Err(Error::invalid_data("negative hash size (or size too big)"));
    }
    context.reader.expect((len as usize).saturating_mul(2));
    let value = context.heap.hash_new(Vec::new());
    let Value::Object(id) = value else {
        return Err(Error::invalid_data("hash allocation failed"));
    };
    context.ref_reader.store(value.clone());
    for _ in 0..len {
        let key = read_value(context)?;
        let item = read_value(context)?;
        if let Some(hash) = context.heap.hash_mut(id) {
            hash.insert(key, item);
        }
    }
    if has_default {
        let default = read_value(context)?;
        if let Some(hash) = context.heap.hash_mut(id) {
            hash.default = default;
        }
    }
    context.leave(value, partial)
}
