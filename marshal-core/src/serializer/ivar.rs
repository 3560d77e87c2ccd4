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

//! Instance variable lists and the protocol entries that share them.
//!
//! A string or regexp carries its encoding as an `E` (or `encoding`) entry,
//! a keyword-flagged hash carries `K`. Those precede the user variables.

use tracing::warn;

use crate::error::Error;
use crate::object::{Encoding, Heap, ObjectId, Payload, Symbol, Value};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{read_value, string::read_symbol, write_value};
use crate::types::{Tag, IVAR_ENCODING_LONG, IVAR_ENCODING_SHORT, IVAR_RUBY2_KEYWORDS};

/// Entries written after an object's payload.
pub(crate) struct Overlay {
    encoding: Option<Encoding>,
    ruby2_keywords: bool,
    ivars: usize,
}

impl Overlay {
    pub(crate) fn of(heap: &Heap, id: ObjectId) -> Overlay {
        let object = heap.get(id);
        let encoding = match object.payload() {
            Payload::String(s) => Some(&s.encoding),
            Payload::Regexp(re) => Some(&re.encoding),
            _ => None,
        };
        Overlay {
            encoding: encoding.filter(|e| **e != Encoding::Binary).cloned(),
            ruby2_keywords: matches!(object.payload(), Payload::Hash(h) if h.ruby2_keywords),
            ivars: dumpable_count(heap, id),
        }
    }

    pub(crate) fn len(&self) -> usize {
        usize::from(self.encoding.is_some()) + usize::from(self.ruby2_keywords) + self.ivars
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub(crate) fn write_overlay(
    context: &mut WriteContext,
    id: ObjectId,
    overlay: &Overlay,
    limit: i32,
) -> Result<(), Error> {
    context.writer.write_long(overlay.len() as i64)?;
    if let Some(encoding) = &overlay.encoding {
        write_encoding(context, encoding)?;
    }
    if overlay.ruby2_keywords {
        context.write_symbol(&Symbol::new(IVAR_RUBY2_KEYWORDS))?;
        context.write_tag(Tag::True);
    }
    write_ivar_pairs(context, id, overlay.ivars, limit)
}

fn write_encoding(context: &mut WriteContext, encoding: &Encoding) -> Result<(), Error> {
    match encoding {
        Encoding::Binary => Ok(()),
        Encoding::UsAscii | Encoding::Utf8 => {
            context.write_symbol(&Symbol::new(IVAR_ENCODING_SHORT))?;
            context.write_tag(if *encoding == Encoding::Utf8 {
                Tag::True
            } else {
                Tag::False
            });
            Ok(())
        }
        Encoding::Named(name) => {
            context.write_symbol(&Symbol::new(IVAR_ENCODING_LONG))?;
            // The name is a throwaway string that still takes an ordinal.
            context.ref_writer.skip();
            context.write_tag(Tag::String);
            context.writer.write_byte_string(name.as_bytes())
        }
    }
}

/// Names the loader reads as encoding or keyword flags.
fn is_reserved(name: &Symbol) -> bool {
    matches!(
        name.as_str(),
        IVAR_ENCODING_SHORT | IVAR_ENCODING_LONG | IVAR_RUBY2_KEYWORDS
    )
}

/// Instance variables of `id` that [`write_ivar_pairs`] will write.
pub(crate) fn dumpable_count(heap: &Heap, id: ObjectId) -> usize {
    heap.get(id)
        .ivars()
        .iter()
        .filter(|(name, _)| !is_reserved(name))
        .count()
}

/// Writes the `count` dumpable instance variables of `id`, failing if the
/// list changes size while its values are written. Variables with reserved
/// names are skipped with a warning.
pub(crate) fn write_ivar_pairs(
    context: &mut WriteContext,
    id: ObjectId,
    count: usize,
    limit: i32,
) -> Result<(), Error> {
    let mut written = 0;
    let mut i = 0;
    while let Some((name, value)) = context.heap.get(id).ivars().get(i).cloned() {
        i += 1;
        if is_reserved(&name) {
            warn!(
                "instance variable `{}' on class {} is not dumped",
                name.as_str(),
                context.heap.class_name(context.heap.get(id).class())
            );
            continue;
        }
        if written == count {
            return Err(ivars_changed(context.heap, id, count));
        }
        context.write_symbol(&name)?;
        write_value(context, &value, limit)?;
        written += 1;
    }
    if written != count {
        return Err(ivars_changed(context.heap, id, count));
    }
    Ok(())
}

fn ivars_changed(heap: &Heap, id: ObjectId, count: usize) -> Error {
    let name = heap.class_name(heap.get(id).class());
    if dumpable_count(heap, id) > count {
        Error::concurrent_mutation(format!("instance variable added to {} instance", name))
    } else {
        Error::concurrent_mutation(format!("instance variable removed from {} instance", name))
    }
}

/// Reads an instance variable list onto `target`.
pub(crate) fn read_ivars(context: &mut ReadContext, target: &Value) -> Result<(), Error> {
    let rest = read_overlay(context, target)?;
    set_ivars(context.heap, target, rest)
}

/// Reads an instance variable list, applying the protocol entries to
/// `target` and returning the user variables.
pub(crate) fn read_overlay(
    context: &mut ReadContext,
    target: &Value,
) -> Result<Vec<(Symbol, Value)>, Error> {
    let len = context.reader.read_long()?;
    if len < 0 {
        return Err(Error::invalid_data("negative instance variable count"));
    }
    context.reader.expect((len as usize).saturating_mul(2));
    let mut rest = Vec::new();
    for _ in 0..len {
        let name = read_symbol(context)?;
        let value = read_value(context)?;
        match name.as_str() {
            IVAR_ENCODING_SHORT | IVAR_ENCODING_LONG => {
                match decode_encoding(context.heap, &name, &value)? {
                    Some(encoding) => set_encoding(context.heap, target, encoding)?,
                    None => rest.push((name, value)),
                }
            }
            IVAR_RUBY2_KEYWORDS => {
                if context.heap.hash(target).is_none() {
                    return Err(Error::invalid_data(format!(
                        "ruby2_keywords flag is given but {} is not a Hash",
                        context.heap.describe(target)
                    )));
                }
                if let Some(hash) = target.as_object().and_then(|id| context.heap.hash_mut(id)) {
                    hash.ruby2_keywords = value.is_truthy();
                }
            }
            _ => rest.push((name, value)),
        }
    }
    Ok(rest)
}

fn decode_encoding(heap: &Heap, name: &Symbol, value: &Value) -> Result<Option<Encoding>, Error> {
    if name.as_str() == IVAR_ENCODING_SHORT {
        return Ok(match value {
            Value::True => Some(Encoding::Utf8),
            Value::False => Some(Encoding::UsAscii),
            _ => None,
        });
    }
    let s = heap
        .string(value)
        .ok_or_else(|| Error::invalid_data("encoding name is not a string"))?;
    Ok(Some(Encoding::from_name(&String::from_utf8_lossy(&s.bytes))))
}

fn set_encoding(heap: &mut Heap, target: &Value, encoding: Encoding) -> Result<(), Error> {
    if let Value::Object(id) = target {
        match &mut heap.get_mut(*id).payload {
            Payload::String(s) => {
                s.encoding = encoding;
                return Ok(());
            }
            Payload::Regexp(re) => {
                re.encoding = encoding;
                return Ok(());
            }
            _ => {}
        }
    }
    if matches!(target, Value::Symbol(_)) {
        return Ok(());
    }
    Err(Error::type_error(format!(
        "{} is not enc_capable",
        heap.describe(target)
    )))
}

pub(crate) fn set_ivars(
    heap: &mut Heap,
    target: &Value,
    pairs: Vec<(Symbol, Value)>,
) -> Result<(), Error> {
    if pairs.is_empty() {
        return Ok(());
    }
    match target {
        Value::Object(id) => {
            for (name, value) in pairs {
                heap.ivar_set(*id, name, value);
            }
            Ok(())
        }
        Value::Class(class) => Err(Error::type_error(format!(
            "can't override instance variable of `{}'",
            heap.class_name(*class)
        ))),
        _ => Err(Error::type_error(format!(
            "can't modify frozen {}",
            heap.describe(target)
        ))),
    }
}
