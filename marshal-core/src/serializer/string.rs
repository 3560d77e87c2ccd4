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

use tracing::debug;

use crate::error::Error;
use crate::object::{Encoding, ObjectId, Payload, RRegexp, Symbol, Value};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{class, ivar, read_value};
use crate::types::{Tag, IVAR_ENCODING_LONG, IVAR_ENCODING_SHORT};

pub(crate) fn write_string(context: &mut WriteContext, id: ObjectId) -> Result<(), Error> {
    let base = context.heap.builtins().string;
    class::write_uclass(context, id, base)?;
    context.write_tag(Tag::String);
    match context.heap.get(id).payload() {
        Payload::String(s) => context.writer.write_byte_string(&s.bytes),
        _ => Err(Error::invalid_data("string payload expected")),
    }
}

pub(crate) fn read_string(context: &mut ReadContext, partial: bool) -> Result<Value, Error> {
    let bytes = context.reader.read_byte_string()?;
    let value = context.heap.bytes_new(bytes, Encoding::Binary);
    context.ref_reader.store(value.clone());
    context.leave(value, partial)
}

pub(crate) fn write_regexp(context: &mut WriteContext, id: ObjectId) -> Result<(), Error> {
    let base = context.heap.builtins().regexp;
    class::write_uclass(context, id, base)?;
    context.write_tag(Tag::Regexp);
    match context.heap.get(id).payload() {
        Payload::Regexp(re) => {
            context.writer.write_byte_string(&re.source)?;
            context.writer.write_u8(re.options);
            Ok(())
        }
        _ => Err(Error::invalid_data("regexp payload expected")),
    }
}

/// Regexps read their own instance variables so the encoding is known
/// before the value is handed out.
pub(crate) fn read_regexp(
    context: &mut ReadContext,
    partial: bool,
    ivp: Option<&mut bool>,
) -> Result<Value, Error> {
    let source = context.reader.read_byte_string()?;
    let options = context.reader.read_u8()?;
    let class = context.heap.builtins().regexp;
    let id = context.heap.allocate(class)?;
    context.heap.get_mut(id).payload = Payload::Regexp(RRegexp {
        source,
        options,
        encoding: Encoding::Binary,
    });
    let value = Value::Object(id);
    context.ref_reader.store(value.clone());
    if let Some(flag) = ivp {
        if *flag {
            ivar::read_ivars(context, &value)?;
            *flag = false;
        }
    }
    context.leave(value, partial)
}

/// Reads a symbol in name position (class paths, member and ivar names).
pub(crate) fn read_symbol(context: &mut ReadContext) -> Result<Symbol, Error> {
    let mut ivar = false;
    loop {
        let byte = context.reader.read_u8()?;
        match Tag::try_from(byte) {
            Ok(Tag::Ivar) => ivar = true,
            Ok(Tag::Symbol) => return read_symreal(context, ivar),
            Ok(Tag::Symlink) => {
                if ivar {
                    return Err(Error::malformed_tag("dump format error (symlink with encoding)"));
                }
                let num = context.reader.read_long()?;
                return context.symbol_reader.get(num);
            }
            _ => {
                return Err(Error::malformed_tag(format!(
                    "dump format error for symbol(0x{:x})",
                    byte
                )))
            }
        }
    }
}

/// Reads the body of a `:` symbol and registers it before any of its
/// instance variables.
pub(crate) fn read_symreal(context: &mut ReadContext, ivar: bool) -> Result<Symbol, Error> {
    let bytes = context.reader.read_byte_string()?;
    let name = String::from_utf8(bytes)
        .map_err(|e| Error::invalid_data(format!("symbol is not valid utf-8: {}", e)))?;
    let symbol = Symbol::from(name);
    context.symbol_reader.store(symbol.clone());
    if ivar {
        let len = context.reader.read_long()?;
        if len < 0 {
            return Err(Error::invalid_data("negative instance variable count"));
        }
        for _ in 0..len {
            let key = read_symbol(context)?;
            read_value(context)?;
            // The text is already utf-8; only the encoding marker is expected.
            if key.as_str() != IVAR_ENCODING_SHORT && key.as_str() != IVAR_ENCODING_LONG {
                debug!(symbol = %symbol, ivar = %key, "ignoring symbol instance variable");
            }
        }
    }
    Ok(symbol)
}
