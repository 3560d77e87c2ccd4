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

//! Tag dispatch for both directions.
//!
//! [`write_value`] classifies a value and hands it to the module owning its
//! shape; [`read_value`] reads a tag and does the reverse. Wrapper tags
//! (`I`, `e`, `C`) are handled here because they nest around any shape.

use crate::error::Error;
use crate::object::{Builtin, ClassId, ObjectId, Value};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::ref_resolver::Identity;
use crate::types::Tag;

pub mod array;
pub mod class;
pub mod ext;
pub mod hash;
pub mod ivar;
pub mod number;
pub mod object;
pub mod string;
pub mod struct_;

/// Writes `value` and everything reachable from it.
///
/// `limit` is the remaining nesting budget: zero fails immediately, every heap
/// value entered takes one from a positive budget, and a negative budget never
/// runs out.
pub fn write_value(context: &mut WriteContext, value: &Value, limit: i32) -> Result<(), Error> {
    if limit == 0 {
        return Err(Error::depth_exceed("exceed depth limit"));
    }
    match value {
        Value::Nil => context.write_tag(Tag::Nil),
        Value::True => context.write_tag(Tag::True),
        Value::False => context.write_tag(Tag::False),
        Value::Integer(v) => number::write_integer(context, *v)?,
        Value::Symbol(symbol) => context.write_symbol(symbol)?,
        Value::Float(v) => number::write_float(context, *v)?,
        Value::Class(class) => {
            if !context
                .ref_writer
                .try_write_ref(&mut context.writer, Identity::Class(*class))?
            {
                class::write_class_ref(context, *class)?;
            }
        }
        Value::Object(id) => write_object(context, *id, limit)?,
    }
    Ok(())
}

fn write_object(context: &mut WriteContext, id: ObjectId, limit: i32) -> Result<(), Error> {
    if context
        .ref_writer
        .try_write_ref(&mut context.writer, Identity::Object(id))?
    {
        return Ok(());
    }
    let limit = if limit > 0 { limit - 1 } else { limit };
    let class = context.heap.get(id).class();
    let hooks = context.heap.class(class).hooks().clone();
    if let Some(hook) = hooks.custom {
        return ext::write_custom(context, id, hook.as_ref(), limit);
    }
    if let Some(hook) = hooks.user {
        return ext::write_user(context, id, hook.as_ref(), limit);
    }

    context.ref_writer.remember(Identity::Object(id));
    let id = object::compat_dump(context, id)?;
    let builtin = context.heap.get(id).payload().builtin();
    let overlay = ivar::Overlay::of(context.heap, id);
    let has_ivars = builtin != Builtin::Object && builtin != Builtin::Integer && !overlay.is_empty();
    if has_ivars {
        context.write_tag(Tag::Ivar);
    }
    match builtin {
        Builtin::String => string::write_string(context, id)?,
        Builtin::Regexp => string::write_regexp(context, id)?,
        Builtin::Array => array::write_array(context, id, limit)?,
        Builtin::Hash => hash::write_hash(context, id, limit)?,
        Builtin::Struct => struct_::write_struct(context, id, limit)?,
        Builtin::Object => object::write_plain(context, id, limit)?,
        Builtin::Integer => number::write_bignum_object(context, id)?,
        Builtin::Data => ext::write_data(context, id, limit)?,
        other => {
            return Err(Error::unsupported(format!(
                "can't dump {:?} payload of {}",
                other,
                context.heap.class_name(class)
            )))
        }
    }
    if has_ivars {
        ivar::write_overlay(context, id, &overlay, limit)?;
    }
    Ok(())
}

/// Reads one complete value.
pub fn read_value(context: &mut ReadContext) -> Result<Value, Error> {
    read_value0(context, false, None, &mut Vec::new())
}

/// Reads one value.
///
/// * `partial` - the caller completes the value itself, so it must stay in
///   the partial set and skip freezing and the callback
/// * `ivp` - set by an enclosing `I` wrapper; a shape that consumes the
///   instance variable list itself clears it
/// * `extmod` - modules collected by enclosing `e` wrappers
pub(crate) fn read_value0(
    context: &mut ReadContext,
    partial: bool,
    ivp: Option<&mut bool>,
    extmod: &mut Vec<ClassId>,
) -> Result<Value, Error> {
    let byte = context.reader.read_u8()?;
    let tag = Tag::try_from(byte)
        .map_err(|_| Error::malformed_tag(format!("dump format error(0x{:x})", byte)))?;
    context.inc_depth()?;
    let result = read_tagged(context, tag, partial, ivp, extmod);
    context.dec_depth();
    result
}

fn read_tagged(
    context: &mut ReadContext,
    tag: Tag,
    partial: bool,
    ivp: Option<&mut bool>,
    extmod: &mut Vec<ClassId>,
) -> Result<Value, Error> {
    match tag {
        Tag::Link => {
            let ref_id = context.reader.read_long()?;
            let (value, is_partial) = context.ref_reader.get(ref_id)?;
            if is_partial {
                Ok(value)
            } else {
                context.post_proc(value)
            }
        }
        Tag::Ivar => {
            let mut ivar = true;
            let value = read_value0(context, true, Some(&mut ivar), extmod)?;
            if ivar {
                ivar::read_ivars(context, &value)?;
            }
            context.leave(value, partial)
        }
        Tag::Extended => {
            let module = class::read_module_name(context)?;
            extmod.push(module);
            let value = read_value0(context, true, None, extmod)?;
            let id = value.as_object().ok_or_else(|| {
                Error::type_error(format!(
                    "can't define singleton for {}",
                    context.heap.describe(&value)
                ))
            })?;
            while let Some(module) = extmod.pop() {
                context.heap.extend_object(id, module);
            }
            context.leave(value, partial)
        }
        Tag::UserClass => {
            let class = class::read_class_name(context)?;
            if context.heap.class(class).is_singleton() {
                return Err(Error::type_error("singleton can't be loaded"));
            }
            let value = read_value0(context, partial, None, extmod)?;
            class::apply_user_class(context, &value, class)?;
            Ok(value)
        }
        Tag::Nil => context.leave(Value::Nil, false),
        Tag::True => context.leave(Value::True, false),
        Tag::False => context.leave(Value::False, false),
        Tag::Fixnum => {
            let v = context.reader.read_long()?;
            context.leave(Value::Integer(v), false)
        }
        Tag::Float => number::read_float(context),
        Tag::Bignum => number::read_bignum(context),
        Tag::String => string::read_string(context, partial),
        Tag::Regexp => string::read_regexp(context, partial, ivp),
        Tag::Array => array::read_array(context, partial),
        Tag::Hash => hash::read_hash(context, partial, false),
        Tag::HashDef => hash::read_hash(context, partial, true),
        Tag::Struct => struct_::read_struct(context, partial),
        Tag::UserDef => ext::read_user(context, partial, ivp),
        Tag::UserMarshal => ext::read_custom(context, partial, extmod),
        Tag::Data => ext::read_data(context, partial),
        Tag::Object => object::read_object(context, partial),
        Tag::Class | Tag::Module | Tag::ModuleOld => {
            class::read_class_ref(context, tag, partial, ivp)
        }
        Tag::Symbol => {
            let ivar = match ivp {
                Some(flag) => std::mem::replace(flag, false),
                None => false,
            };
            let symbol = string::read_symreal(context, ivar)?;
            context.leave(Value::Symbol(symbol), partial)
        }
        Tag::Symlink => {
            let num = context.reader.read_long()?;
            let symbol = context.symbol_reader.get(num)?;
            context.leave(Value::Symbol(symbol), partial)
        }
    }
}
