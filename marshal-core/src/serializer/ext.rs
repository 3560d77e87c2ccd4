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

//! Shapes produced by class hooks: `U` (custom), `u` (opaque bytes) and
//! `d` (wrapped native data).

use crate::error::Error;
use crate::object::{Builtin, ClassId, CustomMarshal, Encoding, ObjectId, UserMarshal, Value};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::ref_resolver::Identity;
use crate::serializer::{class, ivar, read_value, write_value};
use crate::types::Tag;

pub(crate) fn write_custom(
    context: &mut WriteContext,
    id: ObjectId,
    hook: &dyn CustomMarshal,
    limit: i32,
) -> Result<(), Error> {
    context.ref_writer.remember(Identity::Object(id));
    let marshal = context.get_marshal();
    let data = hook.marshal_dump(marshal, context.heap, id)?;
    class::write_class_name(context, Tag::UserMarshal, id, false)?;
    write_value(context, &data, limit)
}

/// The object is remembered only after its bytes are out, so a reference to
/// it from inside the hook's string overlay cannot resolve.
pub(crate) fn write_user(
    context: &mut WriteContext,
    id: ObjectId,
    hook: &dyn UserMarshal,
    limit: i32,
) -> Result<(), Error> {
    let marshal = context.get_marshal();
    let data = hook.dump(marshal, context.heap, id, limit)?;
    let data_id = match data {
        Value::Object(data_id) if context.heap.string(&data).is_some() => data_id,
        _ => return Err(Error::type_error("_dump() must return string")),
    };
    let overlay = ivar::Overlay::of(context.heap, data_id);
    let has_ivars = !overlay.is_empty();
    if has_ivars {
        context.write_tag(Tag::Ivar);
    }
    class::write_class_name(context, Tag::UserDef, id, false)?;
    if let Some(s) = context.heap.string(&data) {
        context.writer.write_byte_string(&s.bytes)?;
    }
    if has_ivars {
        ivar::write_overlay(context, data_id, &overlay, limit)?;
    }
    context.ref_writer.remember(Identity::Object(id));
    Ok(())
}

pub(crate) fn write_data(context: &mut WriteContext, id: ObjectId, limit: i32) -> Result<(), Error> {
    let class = context.heap.get(id).class();
    let hook = context.heap.class(class).hooks().data.clone().ok_or_else(|| {
        Error::unsupported(format!(
            "no _dump_data is defined for class {}",
            context.heap.class_name(class)
        ))
    })?;
    let marshal = context.get_marshal();
    let data = hook.dump_data(marshal, context.heap, id)?;
    class::write_class_name(context, Tag::Data, id, true)?;
    write_value(context, &data, limit)
}

/// `U`: the slot is reserved before the payload is read, so links back to
/// the object from inside its own payload are rejected. Modules from
/// enclosing `e` wrappers are applied before the hook runs.
pub(crate) fn read_custom(
    context: &mut ReadContext,
    partial: bool,
    extmod: &mut Vec<ClassId>,
) -> Result<Value, Error> {
    let class = class::read_class_name(context)?;
    let hook = context.heap.class(class).hooks().custom.clone().ok_or_else(|| {
        Error::type_error(format!(
            "instance of {} needs to have method `marshal_load'",
            context.heap.class_name(class)
        ))
    })?;
    let id = context.heap.allocate(class)?;
    while let Some(module) = extmod.pop() {
        context.heap.extend_object(id, module);
    }
    let ref_id = context.ref_reader.reserve();
    let data = read_value(context)?;
    let marshal = context.get_marshal();
    hook.marshal_load(marshal, context.heap, id, data)?;
    let value = Value::Object(id);
    context.ref_reader.fill(ref_id, value.clone());
    context.leave(value, partial)
}

/// `u`: encoding entries in a wrapping overlay describe the byte string and
/// are applied before the hook runs; any other entries belong to the
/// reconstructed object.
pub(crate) fn read_user(
    context: &mut ReadContext,
    partial: bool,
    ivp: Option<&mut bool>,
) -> Result<Value, Error> {
    let class = class::read_class_name(context)?;
    let hook = context.heap.class(class).hooks().user.clone().ok_or_else(|| {
        Error::type_error(format!(
            "class {} needs to have method `_load'",
            context.heap.class_name(class)
        ))
    })?;
    let bytes = context.reader.read_byte_string()?;
    let data = context.heap.bytes_new(bytes, Encoding::Binary);
    let Value::Object(data_id) = data else {
        return Err(Error::invalid_data("string allocation failed"));
    };
    let mut rest = Vec::new();
    if let Some(flag) = ivp {
        if *flag {
            rest = ivar::read_overlay(context, &data)?;
            *flag = false;
        }
    }
    let marshal = context.get_marshal();
    let value = hook.load(marshal, context.heap, class, data_id)?;
    ivar::set_ivars(context.heap, &value, rest)?;
    context.ref_reader.store(value.clone());
    context.leave(value, partial)
}

pub(crate) fn read_data(context: &mut ReadContext, partial: bool) -> Result<Value, Error> {
    let class = class::read_class_name(context)?;
    let klass = context.heap.class(class);
    if klass.builtin() != Builtin::Data {
        return Err(Error::invalid_data(format!(
            "dump format error ({} is not a data class)",
            klass.name()
        )));
    }
    let id = context.heap.allocate(class)?;
    let value = Value::Object(id);
    context.ref_reader.store(value.clone());
    let hook = context.heap.class(class).hooks().data.clone().ok_or_else(|| {
        Error::type_error(format!(
            "class {} needs to have instance method `_load_data'",
            context.heap.class_name(class)
        ))
    })?;
    let data = read_value(context)?;
    let marshal = context.get_marshal();
    hook.load_data(marshal, context.heap, id, data)?;
    context.leave(value, partial)
}
