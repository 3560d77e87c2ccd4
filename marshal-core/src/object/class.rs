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

use super::{ClassHooks, ClassId, Symbol};

/// Instance shape shared by a builtin class and all of its subclasses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    Object,
    Module,
    Class,
    String,
    Symbol,
    Array,
    Hash,
    Regexp,
    Struct,
    Integer,
    Float,
    Nil,
    True,
    False,
    Data,
}

impl Builtin {
    /// Shapes that may appear under a user-subclass wrapper.
    pub fn is_user_class_capable(self) -> bool {
        matches!(
            self,
            Builtin::String | Builtin::Array | Builtin::Hash | Builtin::Regexp
        )
    }
}

/// A class or module.
#[derive(Clone, Debug)]
pub struct RClass {
    pub(crate) id: ClassId,
    pub(crate) path: Option<String>,
    pub(crate) is_module: bool,
    pub(crate) superclass: Option<ClassId>,
    pub(crate) builtin: Builtin,
    pub(crate) members: Vec<Symbol>,
    pub(crate) singleton: bool,
    pub(crate) hooks: ClassHooks,
}

impl RClass {
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Constant path the class was defined under, `None` when anonymous.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Path for display, falling back to an address-like placeholder.
    pub fn name(&self) -> String {
        match &self.path {
            Some(path) => path.clone(),
            None if self.is_module => format!("#<Module:0x{:016x}>", self.id.0),
            None => format!("#<Class:0x{:016x}>", self.id.0),
        }
    }

    pub fn is_module(&self) -> bool {
        self.is_module
    }

    pub fn superclass(&self) -> Option<ClassId> {
        self.superclass
    }

    pub fn builtin(&self) -> Builtin {
        self.builtin
    }

    /// Member names of a struct class, in declaration order.
    pub fn members(&self) -> &[Symbol] {
        &self.members
    }

    pub fn is_singleton(&self) -> bool {
        self.singleton
    }

    pub fn hooks(&self) -> &ClassHooks {
        &self.hooks
    }
}
