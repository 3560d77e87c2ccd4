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

/// Configuration for dump and load calls.
///
/// Held by [`crate::marshal::Marshal`] and read by every call it runs.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum nesting depth for dumping. Negative means unlimited.
    pub depth_limit: i32,
    /// Maximum tag nesting accepted while loading. `None` means unlimited.
    pub max_load_depth: Option<u32>,
    /// Reject any minor version other than the current one.
    pub strict_version: bool,
    /// Deep-freeze every loaded object.
    pub freeze: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            depth_limit: -1,
            max_load_depth: None,
            strict_version: false,
            freeze: false,
        }
    }
}

impl Config {
    /// Creates a new Config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn depth_limit(&self) -> i32 {
        self.depth_limit
    }

    #[inline(always)]
    pub fn max_load_depth(&self) -> Option<u32> {
        self.max_load_depth
    }

    #[inline(always)]
    pub fn is_strict_version(&self) -> bool {
        self.strict_version
    }

    #[inline(always)]
    pub fn is_freeze(&self) -> bool {
        self.freeze
    }
}
