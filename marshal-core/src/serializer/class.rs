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

//! Class paths on the wire: `c`/`m`/`M` references, the class names inside
//! other shapes, and the `e`/`C` wrappers.

use crate::error::Error;
use crate::object::{ClassId, Heap, ObjectId, Symbol, Value};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::ref_resolver::Identity;
use crate::serializer::string::read_symbol;
use crate::types::Tag;

/// The constant path of `class`, provided it resolves back to `class`.
pub(crate) fn class2path(heap: &Heap, class: ClassId) -> Result<String, Error> {
    let klass = heap.class(class);
    let path = klass.path().ok_or_else(|| {
        let kind = if klass.is_module() { "module" } else { "class" };
        Error::unsupported(format!("can't dump anonymous {} {}", kind, klass.name()))
    })?;
    if heap.lookup_class(path) != Some(class) {
        return Err(Error::unsupported(format!("{} can't be referred to", path)));
    }
    Ok(path.to_string())
}

pub(crate) fn write_class_ref(context: &mut WriteContext, class: ClassId) -> Result<(), Error> {
    context.ref_writer.remember(Identity::Class(class));
    let klass = context.heap.class(class);
    if klass.is_singleton() {
        return Err(Error::unsupported("singleton class can't be dumped"));
    }
    let tag = if klass.is_module() { Tag::Module } else { Tag::Class };
    let path = class2path(context.heap, class)?;
    context.write_tag(tag);
    context.writer.write_byte_string(path.as_bytes())
}

/// One `e` per module the object was extended with, most recent first.
fn write_extended(context: &mut WriteContext, id: ObjectId) -> Result<(), Error> {
    let object = context.heap.get(id);
    if object.singleton_methods {
        return Err(Error::unsupported("singleton can't be dumped"));
    }
    let modules: Vec<ClassId> = object.extended().iter().rev().copied().collect();
    for module in modules {
        let path = class2path(context.heap, module)?;
        context.write_tag(Tag::Extended);
        context.write_symbol(&Symbol::from(path))?;
    }
    Ok(())
}

/// Writes `tag` followed by the class name of `id`.
///
/// Without `check` the object's singleton is ignored and no `e` wrappers are
/// written, as for the `U` and `u` shapes.
pub(crate) fn write_class_name(
    context: &mut WriteContext,
    tag: Tag,
    id: ObjectId,
    check: bool,
) -> Result<(), Error> {
    if check {
        write_extended(context, id)?;
    }
    let class = context.heap.get(id).class();
    let path = class2path(context.heap, class)?;
    context.write_tag(tag);
    context.write_symbol(&Symbol::from(path))
}

/// Prefix for builtin shapes: extensions, then `C` when the object's class
/// is a subclass of `base`.
pub(crate) fn write_uclass(context: &mut WriteContext, id: ObjectId, base: ClassId) -> Result<(), Error> {
    write_extended(context, id)?;
    let class = context.heap.get(id).class();
    if class != base {
        let path = class2path(context.heap, class)?;
        context.write_tag(Tag::UserClass);
        context.write_symbol(&Symbol::from(path))?;
    }
    Ok(())
}

/// Reads a class name that must name a class.
pub(crate) fn read_class_name(context: &mut ReadContext) -> Result<ClassId, Error> {
    let path = read_symbol(context)?;
    let class = context.heap.path_to_class(path.as_str())?;
    if context.heap.class(class).is_module() {
        return Err(Error::type_error(format!("{} does not refer to class", path)));
    }
    Ok(class)
}

/// Reads a class name that must name a module.
pub(crate) fn read_module_name(context: &mut ReadContext) -> Result<ClassId, Error> {
    let path = read_symbol(context)?;
    let module = context.heap.path_to_class(path.as_str())?;
    if !context.heap.class(module).is_module() {
        return Err(Error::type_error(format!("{} does not refer to module", path)));
    }
    Ok(module)
}

pub(crate) fn read_class_ref(
    context: &mut ReadContext,
    tag: Tag,
    partial: bool,
    ivp: Option<&mut bool>,
) -> Result<Value, Error> {
    let bytes = context.reader.read_byte_string()?;
    let path = String::from_utf8(bytes)
        .map_err(|_| Error::invalid_data("class path is not valid utf-8"))?;
    let class = context.heap.path_to_class(&path)?;
    let is_module = context.heap.class(class).is_module();
    let kind = match tag {
        Tag::Class if is_module => {
            return Err(Error::type_error(format!("{} does not refer to class", path)))
        }
        Tag::Module if !is_module => {
            return Err(Error::type_error(format!("{} does not refer to module", path)))
        }
        Tag::Class => "class",
        Tag::Module => "module",
        _ => "class/module",
    };
    if ivp.is_some_and(|ivar| *ivar) {
        return Err(Error::type_error(format!(
            "can't override instance variable of {} `{}'",
            kind, path
        )));
    }
    let value = Value::Class(class);
    context.ref_reader.store(value.clone());
    context.leave(value, partial)
}

/// Retypes a builtin value read under a `C` prefix.
pub(crate) fn apply_user_class(
    context: &mut ReadContext,
    value: &Value,
    class: ClassId,
) -> Result<(), Error> {
    let mismatch = || Error::invalid_data("dump format error (user class)");
    let id = value.as_object().ok_or_else(mismatch)?;
    let builtin = context.heap.get(id).payload().builtin();
    let klass = context.heap.class(class);
    if !builtin.is_user_class_capable() || klass.is_module() || klass.builtin() != builtin {
        return Err(mismatch());
    }
    context.heap.get_mut(id).class = class;
    Ok(())
}
