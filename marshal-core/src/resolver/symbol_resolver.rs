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

use std::collections::HashMap;

use crate::buffer::Writer;
use crate::error::Error;
use crate::object::Symbol;
use crate::types::{Tag, IVAR_ENCODING_SHORT};

/// Symbol table of the dump side.
///
/// Symbols are numbered separately from objects. The first occurrence is
/// written in full, later ones as a [`Tag::Symlink`] to that number.
#[derive(Default)]
pub struct SymbolWriter {
    symbols: HashMap<Symbol, u32>,
}

impl SymbolWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_symbol(&mut self, writer: &mut Writer, symbol: &Symbol) -> Result<(), Error> {
        if let Some(&num) = self.symbols.get(symbol) {
            writer.write_u8(Tag::Symlink.byte());
            writer.write_long(num as i64)?;
            return Ok(());
        }
        // non-ASCII symbol text is UTF-8 and says so
        let utf8 = !symbol.is_ascii();
        if utf8 {
            writer.write_u8(Tag::Ivar.byte());
        }
        writer.write_u8(Tag::Symbol.byte());
        writer.write_byte_string(symbol.as_bytes())?;
        let num = self.symbols.len() as u32;
        self.symbols.insert(symbol.clone(), num);
        if utf8 {
            writer.write_long(1)?;
            self.write_symbol(writer, &Symbol::new(IVAR_ENCODING_SHORT))?;
            writer.write_u8(Tag::True.byte());
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
    }
}

/// Symbol table of the load side.
#[derive(Default)]
pub struct SymbolReader {
    symbols: Vec<Symbol>,
}

impl SymbolReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, symbol: Symbol) -> usize {
        self.symbols.push(symbol);
        self.symbols.len() - 1
    }

    pub fn get(&self, num: i64) -> Result<Symbol, Error> {
        usize::try_from(num)
            .ok()
            .and_then(|index| self.symbols.get(index))
            .cloned()
            .ok_or_else(|| Error::bad_link("bad symbol"))
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
    }
}
