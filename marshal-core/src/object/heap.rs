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

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use super::{
    Builtin, ClassHooks, ClassId, CustomMarshal, DataMarshal, Encoding, ObjectId, RClass, RRegexp,
    RString, Symbol, UserMarshal, Value,
};
use crate::error::Error;

/// Body of a heap object.
pub enum Payload {
    /// Instance variables only.
    Plain,
    String(RString),
    Regexp(RRegexp),
    Array(Vec<Value>),
    Hash(RHash),
    /// Member values in the order of the class's member list.
    Struct(Vec<Value>),
    /// Integer outside the `i64` range.
    Bignum(BigInt),
    /// Opaque native state, restored only through a data hook.
    Data(Option<Box<dyn Any + Send>>),
}

impl Payload {
    /// Builtin shape this payload belongs to.
    pub fn builtin(&self) -> Builtin {
        match self {
            Payload::Plain => Builtin::Object,
            Payload::String(_) => Builtin::String,
            Payload::Regexp(_) => Builtin::Regexp,
            Payload::Array(_) => Builtin::Array,
            Payload::Hash(_) => Builtin::Hash,
            Payload::Struct(_) => Builtin::Struct,
            Payload::Bignum(_) => Builtin::Integer,
            Payload::Data(_) => Builtin::Data,
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Plain => f.write_str("Plain"),
            Payload::String(s) => f.debug_tuple("String").field(s).finish(),
            Payload::Regexp(r) => f.debug_tuple("Regexp").field(r).finish(),
            Payload::Array(a) => f.debug_tuple("Array").field(a).finish(),
            Payload::Hash(h) => f.debug_tuple("Hash").field(h).finish(),
            Payload::Struct(s) => f.debug_tuple("Struct").field(s).finish(),
            Payload::Bignum(b) => f.debug_tuple("Bignum").field(b).finish(),
            Payload::Data(d) => f.debug_tuple("Data").field(&d.is_some()).finish(),
        }
    }
}

/// Insertion-ordered hash table.
///
/// Keys compare by [`Value`] equality, so heap keys compare by identity.
#[derive(Clone, Debug)]
pub struct RHash {
    pub entries: Vec<(Value, Value)>,
    pub default: Value,
    /// A default computed by a block. Such hashes cannot be dumped.
    pub default_proc: bool,
    pub ruby2_keywords: bool,
}

impl Default for RHash {
    fn default() -> Self {
        RHash {
            entries: Vec::new(),
            default: Value::Nil,
            default_proc: false,
            ruby2_keywords: false,
        }
    }
}

impl RHash {
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn insert(&mut self, key: Value, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug)]
pub struct RObject {
    pub(crate) class: ClassId,
    pub(crate) ivars: Vec<(Symbol, Value)>,
    pub(crate) extended: Vec<ClassId>,
    pub(crate) singleton_methods: bool,
    pub(crate) frozen: bool,
    pub(crate) payload: Payload,
}

impl RObject {
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// Instance variables in definition order.
    pub fn ivars(&self) -> &[(Symbol, Value)] {
        &self.ivars
    }

    /// Modules the object was extended with, in the order they were added.
    pub fn extended(&self) -> &[ClassId] {
        &self.extended
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut Payload {
        &mut self.payload
    }
}

/// Classes every heap starts with.
#[derive(Clone, Copy, Debug, Default)]
pub struct Builtins {
    pub object: ClassId,
    pub module: ClassId,
    pub class: ClassId,
    pub string: ClassId,
    pub symbol: ClassId,
    pub array: ClassId,
    pub hash: ClassId,
    pub regexp: ClassId,
    pub struct_: ClassId,
    pub integer: ClassId,
    pub float: ClassId,
    pub nil: ClassId,
    pub true_: ClassId,
    pub false_: ClassId,
    pub data: ClassId,
    pub proc_: ClassId,
    pub io: ClassId,
}

/// Arena owning every object and class of one program state.
pub struct Heap {
    objects: Vec<RObject>,
    classes: Vec<RClass>,
    constants: HashMap<String, ClassId>,
    builtins: Builtins,
}

impl Default for Heap {
    fn default() -> Self {
        Heap::new()
    }
}

impl Heap {
    pub fn new() -> Heap {
        let mut heap = Heap {
            objects: Vec::new(),
            classes: Vec::new(),
            constants: HashMap::new(),
            builtins: Builtins::default(),
        };
        let object = heap.boot_class("Object", None, Builtin::Object, false);
        let module = heap.boot_class("Module", Some(object), Builtin::Module, false);
        let class = heap.boot_class("Class", Some(module), Builtin::Class, false);
        let data = heap.boot_class("Data", Some(object), Builtin::Data, false);
        let builtins = Builtins {
            object,
            module,
            class,
            string: heap.boot_class("String", Some(object), Builtin::String, false),
            symbol: heap.boot_class("Symbol", Some(object), Builtin::Symbol, false),
            array: heap.boot_class("Array", Some(object), Builtin::Array, false),
            hash: heap.boot_class("Hash", Some(object), Builtin::Hash, false),
            regexp: heap.boot_class("Regexp", Some(object), Builtin::Regexp, false),
            struct_: heap.boot_class("Struct", Some(object), Builtin::Struct, false),
            integer: heap.boot_class("Integer", Some(object), Builtin::Integer, false),
            float: heap.boot_class("Float", Some(object), Builtin::Float, false),
            nil: heap.boot_class("NilClass", Some(object), Builtin::Nil, false),
            true_: heap.boot_class("TrueClass", Some(object), Builtin::True, false),
            false_: heap.boot_class("FalseClass", Some(object), Builtin::False, false),
            data,
            proc_: heap.boot_class("Proc", Some(data), Builtin::Data, false),
            io: heap.boot_class("IO", Some(data), Builtin::Data, false),
        };
        heap.builtins = builtins;
        heap
    }

    fn boot_class(
        &mut self,
        path: &str,
        superclass: Option<ClassId>,
        builtin: Builtin,
        is_module: bool,
    ) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(RClass {
            id,
            path: Some(path.to_string()),
            is_module,
            superclass,
            builtin,
            members: Vec::new(),
            singleton: false,
            hooks: ClassHooks::default(),
        });
        self.constants.insert(path.to_string(), id);
        id
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// Defines a named class. Instances take the shape of `superclass`.
    pub fn define_class(&mut self, path: &str, superclass: ClassId) -> ClassId {
        let builtin = self.class(superclass).builtin;
        let members = self.class(superclass).members.clone();
        let id = self.boot_class(path, Some(superclass), builtin, false);
        self.classes[id.index()].members = members;
        id
    }

    pub fn define_module(&mut self, path: &str) -> ClassId {
        self.boot_class(path, None, Builtin::Object, true)
    }

    /// Defines a struct class with the given member names.
    pub fn define_struct(&mut self, path: &str, members: &[&str]) -> ClassId {
        let id = self.boot_class(path, Some(self.builtins.struct_), Builtin::Struct, false);
        self.classes[id.index()].members = members.iter().map(|m| Symbol::new(m)).collect();
        id
    }

    pub fn define_anonymous_class(&mut self, superclass: ClassId) -> ClassId {
        let id = self.define_class("", superclass);
        self.constants.remove("");
        self.classes[id.index()].path = None;
        id
    }

    pub fn define_anonymous_module(&mut self) -> ClassId {
        let id = self.define_module("");
        self.constants.remove("");
        self.classes[id.index()].path = None;
        id
    }

    /// Unbinds a constant. The class keeps its path but no longer resolves by it.
    pub fn remove_const(&mut self, path: &str) -> Option<ClassId> {
        self.constants.remove(path)
    }

    /// Marks `object` as carrying methods of its own.
    pub fn define_singleton_method(&mut self, object: ObjectId) {
        self.objects[object.index()].singleton_methods = true;
    }

    /// Defines the class holding per-object behavior of `object`. It has no
    /// path and cannot be instantiated.
    pub fn singleton_class(&mut self, object: ObjectId) -> ClassId {
        let class = self.get(object).class;
        let id = self.define_anonymous_class(class);
        self.classes[id.index()].singleton = true;
        id
    }

    pub fn set_custom_marshal(&mut self, class: ClassId, hook: Arc<dyn CustomMarshal>) {
        self.classes[class.index()].hooks.custom = Some(hook);
    }

    pub fn set_user_marshal(&mut self, class: ClassId, hook: Arc<dyn UserMarshal>) {
        self.classes[class.index()].hooks.user = Some(hook);
    }

    pub fn set_data_marshal(&mut self, class: ClassId, hook: Arc<dyn DataMarshal>) {
        self.classes[class.index()].hooks.data = Some(hook);
    }

    pub fn class(&self, id: ClassId) -> &RClass {
        &self.classes[id.index()]
    }

    pub fn class_name(&self, id: ClassId) -> String {
        self.class(id).name()
    }

    pub fn lookup_class(&self, path: &str) -> Option<ClassId> {
        self.constants.get(path).copied()
    }

    /// Resolves a constant path to a class or module.
    pub fn path_to_class(&self, path: &str) -> Result<ClassId, Error> {
        self.lookup_class(path)
            .ok_or_else(|| Error::undefined_class(path.to_string()))
    }

    /// Whether `class` is `ancestor` or inherits from it.
    pub fn is_subclass_of(&self, class: ClassId, ancestor: ClassId) -> bool {
        let mut current = Some(class);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.class(c).superclass;
        }
        false
    }

    pub fn class_of(&self, value: &Value) -> ClassId {
        let b = &self.builtins;
        match value {
            Value::Nil => b.nil,
            Value::True => b.true_,
            Value::False => b.false_,
            Value::Integer(_) => b.integer,
            Value::Float(_) => b.float,
            Value::Symbol(_) => b.symbol,
            Value::Object(id) => self.get(*id).class,
            Value::Class(id) if self.class(*id).is_module => b.module,
            Value::Class(_) => b.class,
        }
    }

    /// Short human-readable form of a value, used in error messages.
    pub fn describe(&self, value: &Value) -> String {
        match value {
            Value::Nil => "nil".to_string(),
            Value::True => "true".to_string(),
            Value::False => "false".to_string(),
            Value::Integer(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Symbol(s) => format!(":{}", s),
            Value::Class(c) => self.class_name(*c),
            Value::Object(id) => match &self.get(*id).payload {
                Payload::String(s) => format!("{:?}", String::from_utf8_lossy(&s.bytes)),
                Payload::Bignum(b) => b.to_string(),
                _ => format!("#<{}>", self.class_name(self.get(*id).class)),
            },
        }
    }

    fn alloc(&mut self, class: ClassId, payload: Payload) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(RObject {
            class,
            ivars: Vec::new(),
            extended: Vec::new(),
            singleton_methods: false,
            frozen: false,
            payload,
        });
        id
    }

    /// Allocates an empty instance of `class`, shaped by its builtin ancestor.
    pub fn allocate(&mut self, class: ClassId) -> Result<ObjectId, Error> {
        let klass = self.class(class);
        if klass.is_module {
            return Err(Error::type_error(format!(
                "allocator undefined for {}",
                klass.name()
            )));
        }
        if klass.singleton {
            return Err(Error::type_error("can't create instance of singleton class"));
        }
        let payload = match klass.builtin {
            Builtin::Object => Payload::Plain,
            Builtin::String => Payload::String(RString::new(Vec::new(), Encoding::Binary)),
            Builtin::Regexp => Payload::Regexp(RRegexp {
                source: Vec::new(),
                options: 0,
                encoding: Encoding::Binary,
            }),
            Builtin::Array => Payload::Array(Vec::new()),
            Builtin::Hash => Payload::Hash(RHash::default()),
            Builtin::Struct => Payload::Struct(vec![Value::Nil; klass.members.len()]),
            Builtin::Data => Payload::Data(None),
            _ => {
                return Err(Error::type_error(format!(
                    "allocator undefined for {}",
                    klass.name()
                )))
            }
        };
        Ok(self.alloc(class, payload))
    }

    /// New UTF-8 string.
    pub fn str_new(&mut self, s: &str) -> Value {
        self.bytes_new(s.as_bytes().to_vec(), Encoding::Utf8)
    }

    pub fn bytes_new(&mut self, bytes: Vec<u8>, encoding: Encoding) -> Value {
        let class = self.builtins.string;
        Value::Object(self.alloc(class, Payload::String(RString::new(bytes, encoding))))
    }

    pub fn regexp_new(&mut self, source: &str, options: u8) -> Value {
        let encoding = if source.is_ascii() {
            Encoding::UsAscii
        } else {
            Encoding::Utf8
        };
        let class = self.builtins.regexp;
        let regexp = RRegexp {
            source: source.as_bytes().to_vec(),
            options,
            encoding,
        };
        Value::Object(self.alloc(class, Payload::Regexp(regexp)))
    }

    pub fn array_new(&mut self, items: Vec<Value>) -> Value {
        let class = self.builtins.array;
        Value::Object(self.alloc(class, Payload::Array(items)))
    }

    pub fn hash_new(&mut self, entries: Vec<(Value, Value)>) -> Value {
        let mut hash = RHash::default();
        for (k, v) in entries {
            hash.insert(k, v);
        }
        let class = self.builtins.hash;
        Value::Object(self.alloc(class, Payload::Hash(hash)))
    }

    /// New struct instance. Missing trailing members are nil.
    pub fn struct_new(&mut self, class: ClassId, values: Vec<Value>) -> Result<Value, Error> {
        let klass = self.class(class);
        if klass.builtin != Builtin::Struct {
            return Err(Error::type_error(format!("{} is not a struct", klass.name())));
        }
        if values.len() > klass.members.len() {
            return Err(Error::invalid_data("struct size differs"));
        }
        let id = self.allocate(class)?;
        if let Payload::Struct(slots) = &mut self.objects[id.index()].payload {
            for (slot, value) in slots.iter_mut().zip(values) {
                *slot = value;
            }
        }
        Ok(Value::Object(id))
    }

    /// New plain instance of `class` with the given instance variables.
    pub fn object_new(&mut self, class: ClassId, ivars: Vec<(&str, Value)>) -> Result<Value, Error> {
        let id = self.allocate(class)?;
        for (name, value) in ivars {
            self.ivar_set(id, name, value);
        }
        Ok(Value::Object(id))
    }

    pub fn data_new(&mut self, class: ClassId, data: Box<dyn Any + Send>) -> Result<Value, Error> {
        if self.class(class).builtin != Builtin::Data {
            return Err(Error::type_error(format!(
                "{} is not a data class",
                self.class_name(class)
            )));
        }
        let id = self.allocate(class)?;
        self.set_data(id, data)?;
        Ok(Value::Object(id))
    }

    /// Integer value, boxed on the heap only when it does not fit `i64`.
    pub fn integer_new(&mut self, value: BigInt) -> Value {
        match value.to_i64() {
            Some(v) => Value::Integer(v),
            None => {
                let class = self.builtins.integer;
                Value::Object(self.alloc(class, Payload::Bignum(value)))
            }
        }
    }

    pub fn get(&self, id: ObjectId) -> &RObject {
        &self.objects[id.index()]
    }

    pub fn get_mut(&mut self, id: ObjectId) -> &mut RObject {
        &mut self.objects[id.index()]
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn ivar_get(&self, id: ObjectId, name: &str) -> Option<&Value> {
        self.get(id)
            .ivars
            .iter()
            .find(|(k, _)| k.as_str() == name)
            .map(|(_, v)| v)
    }

    pub fn ivar_set(&mut self, id: ObjectId, name: impl Into<Symbol>, value: Value) {
        let name = name.into();
        let ivars = &mut self.objects[id.index()].ivars;
        match ivars.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => ivars.push((name, value)),
        }
    }

    pub fn extend_object(&mut self, id: ObjectId, module: ClassId) {
        let extended = &mut self.objects[id.index()].extended;
        extended.retain(|m| *m != module);
        extended.push(module);
    }

    pub fn freeze(&mut self, id: ObjectId) {
        self.objects[id.index()].frozen = true;
    }

    /// Immediates and classes are always reported frozen.
    pub fn is_frozen(&self, value: &Value) -> bool {
        match value {
            Value::Object(id) => self.get(*id).frozen,
            _ => true,
        }
    }

    pub fn string(&self, value: &Value) -> Option<&RString> {
        match &self.get(value.as_object()?).payload {
            Payload::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn regexp(&self, value: &Value) -> Option<&RRegexp> {
        match &self.get(value.as_object()?).payload {
            Payload::Regexp(r) => Some(r),
            _ => None,
        }
    }

    pub fn array(&self, value: &Value) -> Option<&[Value]> {
        match &self.get(value.as_object()?).payload {
            Payload::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn array_mut(&mut self, id: ObjectId) -> Option<&mut Vec<Value>> {
        match &mut self.objects[id.index()].payload {
            Payload::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn hash(&self, value: &Value) -> Option<&RHash> {
        match &self.get(value.as_object()?).payload {
            Payload::Hash(h) => Some(h),
            _ => None,
        }
    }

    pub fn hash_mut(&mut self, id: ObjectId) -> Option<&mut RHash> {
        match &mut self.objects[id.index()].payload {
            Payload::Hash(h) => Some(h),
            _ => None,
        }
    }

    pub fn struct_values(&self, value: &Value) -> Option<&[Value]> {
        match &self.get(value.as_object()?).payload {
            Payload::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Member value of a struct instance by name.
    pub fn struct_get(&self, value: &Value, member: &str) -> Option<&Value> {
        let id = value.as_object()?;
        let members = &self.class(self.get(id).class).members;
        let index = members.iter().position(|m| m.as_str() == member)?;
        self.struct_values(value)?.get(index)
    }

    pub fn bignum(&self, value: &Value) -> Option<&BigInt> {
        match &self.get(value.as_object()?).payload {
            Payload::Bignum(b) => Some(b),
            _ => None,
        }
    }

    pub fn data<T: 'static>(&self, id: ObjectId) -> Option<&T> {
        match &self.get(id).payload {
            Payload::Data(Some(data)) => data.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn set_data(&mut self, id: ObjectId, data: Box<dyn Any + Send>) -> Result<(), Error> {
        match &mut self.objects[id.index()].payload {
            Payload::Data(slot) => {
                *slot = Some(data);
                Ok(())
            }
            _ => Err(Error::type_error("wrong argument type (expected data)")),
        }
    }

    /// Structural equality of two value graphs.
    ///
    /// Classes, payloads, instance variables and extended modules are compared.
    /// Cycles are followed once; a pair met again is assumed equal. Data
    /// payloads compare by identity.
    pub fn deep_eq(&self, a: &Value, b: &Value) -> bool {
        let mut seen = HashSet::new();
        self.deep_eq_inner(a, b, &mut seen)
    }

    fn deep_eq_inner(
        &self,
        a: &Value,
        b: &Value,
        seen: &mut HashSet<(ObjectId, ObjectId)>,
    ) -> bool {
        match (a, b) {
            (Value::Float(x), Value::Float(y)) => {
                x.to_bits() == y.to_bits() || (x.is_nan() && y.is_nan())
            }
            (Value::Object(x), Value::Object(y)) => {
                if x == y || !seen.insert((*x, *y)) {
                    return true;
                }
                let (ox, oy) = (self.get(*x), self.get(*y));
                if ox.class != oy.class || ox.extended != oy.extended {
                    return false;
                }
                if ox.ivars.len() != oy.ivars.len()
                    || !ox.ivars.iter().zip(&oy.ivars).all(|((kx, vx), (ky, vy))| {
                        kx == ky && self.deep_eq_inner(vx, vy, seen)
                    })
                {
                    return false;
                }
                self.payload_eq(&ox.payload, &oy.payload, seen)
            }
            _ => a == b,
        }
    }

    fn payload_eq(
        &self,
        a: &Payload,
        b: &Payload,
        seen: &mut HashSet<(ObjectId, ObjectId)>,
    ) -> bool {
        match (a, b) {
            (Payload::Plain, Payload::Plain) => true,
            (Payload::String(x), Payload::String(y)) => x == y,
            (Payload::Regexp(x), Payload::Regexp(y)) => x == y,
            (Payload::Bignum(x), Payload::Bignum(y)) => x == y,
            (Payload::Array(x), Payload::Array(y)) | (Payload::Struct(x), Payload::Struct(y)) => {
                x.len() == y.len()
                    && x.iter().zip(y).all(|(vx, vy)| self.deep_eq_inner(vx, vy, seen))
            }
            (Payload::Hash(x), Payload::Hash(y)) => {
                x.len() == y.len()
                    && x.ruby2_keywords == y.ruby2_keywords
                    && self.deep_eq_inner(&x.default, &y.default, seen)
                    && x.entries.iter().zip(&y.entries).all(|((kx, vx), (ky, vy))| {
                        self.deep_eq_inner(kx, ky, seen) && self.deep_eq_inner(vx, vy, seen)
                    })
            }
            _ => false,
        }
    }
}
