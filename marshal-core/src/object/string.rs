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

/// Character encoding tag carried by strings, regexps and symbols.
///
/// Only the tag is tracked. Bytes are never transcoded.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Raw bytes. Written without an encoding overlay.
    Binary,
    UsAscii,
    Utf8,
    /// Any other encoding, written by name.
    Named(String),
}

impl Encoding {
    pub fn from_name(name: &str) -> Encoding {
        match name.to_ascii_uppercase().as_str() {
            "ASCII-8BIT" | "BINARY" => Encoding::Binary,
            "US-ASCII" | "ASCII" | "ANSI_X3.4-1968" | "646" => Encoding::UsAscii,
            "UTF-8" | "CP65001" => Encoding::Utf8,
            _ => Encoding::Named(name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Encoding::Binary => "ASCII-8BIT",
            Encoding::UsAscii => "US-ASCII",
            Encoding::Utf8 => "UTF-8",
            Encoding::Named(name) => name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RString {
    pub bytes: Vec<u8>,
    pub encoding: Encoding,
}

impl RString {
    pub fn new(bytes: Vec<u8>, encoding: Encoding) -> RString {
        RString { bytes, encoding }
    }

    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RRegexp {
    pub source: Vec<u8>,
    pub options: u8,
    pub encoding: Encoding,
}

impl RRegexp {
    pub const IGNORECASE: u8 = 1;
    pub const EXTENDED: u8 = 2;
    pub const MULTILINE: u8 = 4;
}
