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
use crate::object::{Builtin, ObjectId, Payload, Value};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{class, read_value, string::read_symbol, write_value};
use crate::types::Tag;

/// `S`, class name, member count, then `(member, value)` pairs in declaration order.
pub(crate) fn write_struct(context: &mut WriteContext, id: ObjectId, limit: i32) -> Result<(), Error> {
    class::write_class_name(context, Tag::Struct, id, true)?;
    let this = Value::Object(id);
    let class = context.heap.get(id).class();
    let members = context.heap.class(class).members().to_vec();
    let len = context.heap.struct_values(&this).map_or(0, |values| values.len());
    context.writer.write_long(len as i64)?;
    for i in 0..len {
        let value = context
            .heap
            .struct_values(&this)
            .and_then(|values| values.get(i))
            .cloned()
            .ok_or_else(modified)?;
        let member = members.get(i).ok_or_else(modified)?;
        context.write_symbol(member)?;
        write_value(context, &value, limit)?;
    }
    Ok(())
}

fn modified() -> Error {
    Error::concurrent_mutation("struct modified during dump")
}

pub(crate) fn read_struct(context: &mut ReadContext, partial: bool) -> Result<Value, Error> {
    let class = class::read_class_name(context)?;
    let len = context.reader.read_long()?;
    let klass = context.heap.class(class);
    let name = klass.name();
    if klass.builtin() != Builtin::Struct {
        return Err(Error::type_error(format!("class {} not a struct", name)));
    }
    let members = klass.members().to_vec();
    if members.len() as i64 != len {
        return Err(Error::struct_mismatch(format!(
            "struct {} not compatible (struct size differs)",
            name
        )));
    }
    context.reader.expect(members.len() * 2);
    let id = context.heap.allocate(class)?;
    let value = Value::Object(id);
    context.ref_reader.store(value.clone());
    for (i, member) in members.iter().enumerate() {
        let slot = read_symbol(context)?;
        if slot != *member {
            return Err(Error::struct_mismatch(format!(
                "struct {} not compatible (:{} for :{})",
                name, slot, member
            )));
        }
        let item = read_value(context)?;
        if let Payload::Struct(values) = &mut context.heap.get_mut(id).payload {
            if let Some(v) = values.get_mut(i) {
                *v = item;
            }
        }
    }
    context.leave(value, partial)
}
