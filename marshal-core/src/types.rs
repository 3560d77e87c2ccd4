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

use num_enum::{IntoPrimitive, TryFromPrimitive};

pub const MARSHAL_MAJOR: u8 = 4;
pub const MARSHAL_MINOR: u8 = 8;

/// Smallest integer written inline with [`Tag::Fixnum`].
pub const FIXNUM_MIN: i64 = -(1 << 30);
/// Largest integer written inline with [`Tag::Fixnum`].
pub const FIXNUM_MAX: i64 = (1 << 30) - 1;

/// Short encoding marker: `true` is UTF-8, `false` is US-ASCII.
pub const IVAR_ENCODING_SHORT: &str = "E";
/// Long encoding marker carrying the encoding name as a string.
pub const IVAR_ENCODING_LONG: &str = "encoding";
/// Marks a hash as a keyword-argument hash.
pub const IVAR_RUBY2_KEYWORDS: &str = "K";

/// One-byte type tag that opens every encoded value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Tag {
    // '0'
    Nil = 0x30,
    // 'T'
    True = 0x54,
    // 'F'
    False = 0x46,
    // 'i'
    Fixnum = 0x69,
    // 'e', module names an object was extended with
    Extended = 0x65,
    // 'C', builtin payload owned by a user subclass
    UserClass = 0x43,
    // 'o'
    Object = 0x6f,
    // 'd'
    Data = 0x64,
    // 'u', `_dump` string payload
    UserDef = 0x75,
    // 'U', `marshal_dump` value payload
    UserMarshal = 0x55,
    // 'f'
    Float = 0x66,
    // 'l'
    Bignum = 0x6c,
    // '"'
    String = 0x22,
    // '/'
    Regexp = 0x2f,
    // '['
    Array = 0x5b,
    // '{'
    Hash = 0x7b,
    // '}', hash followed by its default value
    HashDef = 0x7d,
    // 'S'
    Struct = 0x53,
    // 'M', old class-or-module reference
    ModuleOld = 0x4d,
    // 'c'
    Class = 0x63,
    // 'm'
    Module = 0x6d,
    // ':'
    Symbol = 0x3a,
    // ';'
    Symlink = 0x3b,
    // 'I', instance variable overlay on the following value
    Ivar = 0x49,
    // '@'
    Link = 0x40,
}

impl Tag {
    #[inline(always)]
    pub fn byte(self) -> u8 {
        self.into()
    }
}
