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

//! Values survive a dump and load into a second heap that defines the same
//! classes.

use marshal::{Encoding, Heap, Marshal, Symbol, Value};
use num_bigint::BigInt;

/// Builds the same class table in any heap.
fn schema(heap: &mut Heap) {
    let object = heap.builtins().object;
    let string = heap.builtins().string;
    let hash = heap.builtins().hash;
    heap.define_struct("Point", &["x", "y"]);
    heap.define_class("User", object);
    heap.define_class("Name", string);
    heap.define_class("Options", hash);
    heap.define_module("Tagged");
}

fn roundtrip(src: &mut Heap, value: &Value) -> (Heap, Value) {
    let bytes = marshal::dump(src, value, -1).unwrap();
    let mut dst = Heap::new();
    schema(&mut dst);
    let loaded = marshal::load(&mut dst, &bytes, None, false).unwrap();
    (dst, loaded)
}

/// Structural equality across two heaps, by dumping the loaded value again.
fn assert_same_bytes(src: &mut Heap, value: &Value) {
    let first = marshal::dump(src, value, -1).unwrap();
    let (mut dst, loaded) = roundtrip(src, value);
    let second = marshal::dump(&mut dst, &loaded, -1).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_immediates_roundtrip() {
    let mut heap = Heap::new();
    schema(&mut heap);
    for value in [
        Value::Nil,
        Value::True,
        Value::False,
        Value::Integer(0),
        Value::Integer(-1),
        Value::Integer(1_000_000),
        Value::Integer((1 << 30) - 1),
        Value::Integer(-(1 << 30)),
        Value::Integer(i64::MAX),
        Value::Integer(i64::MIN),
        Value::Float(3.25),
        Value::Float(f64::INFINITY),
        Value::Symbol(Symbol::new("name")),
    ] {
        let (_, loaded) = roundtrip(&mut heap, &value);
        assert_eq!(loaded, value);
    }
}

#[test]
fn test_float_special_values() {
    let mut heap = Heap::new();
    let (_, nan) = roundtrip(&mut heap, &Value::Float(f64::NAN));
    assert!(nan.as_float().unwrap().is_nan());
    let (_, zero) = roundtrip(&mut heap, &Value::Float(-0.0));
    assert!(zero.as_float().unwrap().is_sign_negative());
}

#[test]
fn test_bignum_roundtrip() {
    let mut heap = Heap::new();
    let big: BigInt = BigInt::from(7u8).pow(100);
    let value = heap.integer_new(-big.clone());
    let (dst, loaded) = roundtrip(&mut heap, &value);
    assert_eq!(dst.bignum(&loaded), Some(&-big));
}

#[test]
fn test_strings_keep_bytes_and_encoding() {
    let mut heap = Heap::new();
    let utf8 = heap.str_new("h\u{e9}llo");
    let (dst, loaded) = roundtrip(&mut heap, &utf8);
    let s = dst.string(&loaded).unwrap();
    assert_eq!(s.as_str(), Some("h\u{e9}llo"));
    assert_eq!(s.encoding, Encoding::Utf8);

    let raw = heap.bytes_new(vec![0, 159, 146, 150], Encoding::Binary);
    let (dst, loaded) = roundtrip(&mut heap, &raw);
    let s = dst.string(&loaded).unwrap();
    assert_eq!(s.bytes, vec![0, 159, 146, 150]);
    assert_eq!(s.encoding, Encoding::Binary);

    let euc = heap.bytes_new(b"abc".to_vec(), Encoding::Named("EUC-JP".to_string()));
    let (dst, loaded) = roundtrip(&mut heap, &euc);
    assert_eq!(
        dst.string(&loaded).unwrap().encoding,
        Encoding::Named("EUC-JP".to_string())
    );
}

#[test]
fn test_collections_roundtrip() {
    let mut heap = Heap::new();
    schema(&mut heap);
    let key = heap.str_new("k");
    let inner = heap.array_new(vec![Value::Integer(1), Value::Float(2.5), Value::Nil]);
    let map = heap.hash_new(vec![
        (key, inner),
        (Value::Symbol(Symbol::new("flag")), Value::True),
    ]);
    let list = heap.array_new(vec![map, Value::Symbol(Symbol::new("flag"))]);
    assert_same_bytes(&mut heap, &list);

    let (dst, loaded) = roundtrip(&mut heap, &list);
    let items = dst.array(&loaded).unwrap();
    let map = dst.hash(&items[0]).unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(
        map.get(&Value::Symbol(Symbol::new("flag"))),
        Some(&Value::True)
    );
}

#[test]
fn test_hash_default_and_keywords_flag() {
    let mut heap = Heap::new();
    let value = heap.hash_new(vec![(Value::Integer(1), Value::Integer(2))]);
    let id = value.as_object().unwrap();
    heap.hash_mut(id).unwrap().default = Value::Symbol(Symbol::new("missing"));
    let (dst, loaded) = roundtrip(&mut heap, &value);
    let hash = dst.hash(&loaded).unwrap();
    assert_eq!(hash.default, Value::Symbol(Symbol::new("missing")));
    assert!(!hash.ruby2_keywords);

    heap.hash_mut(id).unwrap().ruby2_keywords = true;
    let (dst, loaded) = roundtrip(&mut heap, &value);
    assert!(dst.hash(&loaded).unwrap().ruby2_keywords);
}

#[test]
fn test_struct_and_plain_object_roundtrip() {
    let mut heap = Heap::new();
    schema(&mut heap);
    let point = heap.lookup_class("Point").unwrap();
    let user = heap.lookup_class("User").unwrap();
    let p = heap
        .struct_new(point, vec![Value::Integer(3), Value::Integer(-4)])
        .unwrap();
    let name = heap.str_new("ada");
    let u = heap
        .object_new(user, vec![("@name", name), ("@home", p)])
        .unwrap();

    let (dst, loaded) = roundtrip(&mut heap, &u);
    let id = loaded.as_object().unwrap();
    assert_eq!(dst.class_name(dst.get(id).class()), "User");
    let name = dst.ivar_get(id, "@name").unwrap();
    assert_eq!(dst.string(name).unwrap().as_str(), Some("ada"));
    let home = dst.ivar_get(id, "@home").unwrap();
    assert_eq!(dst.struct_get(home, "y"), Some(&Value::Integer(-4)));
}

#[test]
fn test_subclasses_and_extensions_roundtrip() {
    let mut heap = Heap::new();
    schema(&mut heap);
    let name_class = heap.lookup_class("Name").unwrap();
    let options_class = heap.lookup_class("Options").unwrap();
    let tagged = heap.lookup_class("Tagged").unwrap();

    let name = heap.allocate(name_class).unwrap();
    if let marshal::Payload::String(s) = heap.get_mut(name).payload_mut() {
        s.bytes = b"bob".to_vec();
        s.encoding = Encoding::Utf8;
    }
    heap.ivar_set(name, "@nick", Value::True);
    let options = heap.allocate(options_class).unwrap();
    heap.extend_object(options, tagged);
    let list = heap.array_new(vec![Value::Object(name), Value::Object(options)]);
    assert_same_bytes(&mut heap, &list);

    let (dst, loaded) = roundtrip(&mut heap, &list);
    let items = dst.array(&loaded).unwrap().to_vec();
    let name = items[0].as_object().unwrap();
    assert_eq!(dst.class_name(dst.get(name).class()), "Name");
    assert_eq!(dst.ivar_get(name, "@nick"), Some(&Value::True));
    assert_eq!(dst.string(&items[0]).unwrap().encoding, Encoding::Utf8);
    let options = items[1].as_object().unwrap();
    assert_eq!(dst.class_name(dst.get(options).class()), "Options");
    assert_eq!(dst.get(options).extended(), &[dst.lookup_class("Tagged").unwrap()]);
}

#[test]
fn test_regexp_roundtrip() {
    let mut heap = Heap::new();
    let re = heap.regexp_new("^a+$", marshal::RRegexp::IGNORECASE);
    let (dst, loaded) = roundtrip(&mut heap, &re);
    let re = dst.regexp(&loaded).unwrap();
    assert_eq!(re.source, b"^a+$".to_vec());
    assert_eq!(re.options, marshal::RRegexp::IGNORECASE);
    assert_eq!(re.encoding, Encoding::UsAscii);
}

#[test]
fn test_classes_roundtrip() {
    let mut heap = Heap::new();
    schema(&mut heap);
    let user = heap.lookup_class("User").unwrap();
    let tagged = heap.lookup_class("Tagged").unwrap();
    let list = heap.array_new(vec![Value::Class(user), Value::Class(tagged)]);
    let (dst, loaded) = roundtrip(&mut heap, &list);
    let items = dst.array(&loaded).unwrap();
    assert_eq!(items[0], Value::Class(dst.lookup_class("User").unwrap()));
    assert_eq!(items[1], Value::Class(dst.lookup_class("Tagged").unwrap()));
}

#[test]
fn test_deep_eq_after_roundtrip_in_same_heap() {
    let mut heap = Heap::new();
    schema(&mut heap);
    let s = heap.str_new("same");
    let value = heap.array_new(vec![s, Value::Float(0.1), Value::Integer(9)]);
    let bytes = Marshal::default().dump(&mut heap, &value).unwrap();
    let loaded = Marshal::default().load(&mut heap, &bytes).unwrap();
    assert_ne!(loaded, value);
    assert!(heap.deep_eq(&loaded, &value));
}

#[test]
fn test_reserved_ivar_names_are_not_dumped() {
    let mut heap = Heap::new();
    schema(&mut heap);
    let user = heap.lookup_class("User").unwrap();
    let u = heap
        .object_new(user, vec![("K", Value::True), ("@name", Value::Integer(1))])
        .unwrap();
    let bytes = marshal::dump(&mut heap, &u, -1).unwrap();
    assert_eq!(&bytes[2..], b"o:\x09User\x06:\x0a@namei\x06");
    let (dst, loaded) = roundtrip(&mut heap, &u);
    let id = loaded.as_object().unwrap();
    assert_eq!(dst.get(id).ivars(), &[(Symbol::new("@name"), Value::Integer(1))]);

    // A binary string keeps its encoding and loses the stray entry.
    let raw = heap.bytes_new(b"abc".to_vec(), Encoding::Binary);
    heap.ivar_set(raw.as_object().unwrap(), "E", Value::True);
    let bytes = marshal::dump(&mut heap, &raw, -1).unwrap();
    assert_eq!(&bytes[2..], b"\"\x08abc");
    let (dst, loaded) = roundtrip(&mut heap, &raw);
    assert_eq!(dst.string(&loaded).unwrap().encoding, Encoding::Binary);
    assert!(dst.get(loaded.as_object().unwrap()).ivars().is_empty());

    let text = heap.str_new("abc");
    let text_id = text.as_object().unwrap();
    let spoof = heap.str_new("Shift_JIS");
    heap.ivar_set(text_id, "encoding", spoof);
    heap.ivar_set(text_id, "@a", Value::Integer(1));
    let bytes = marshal::dump(&mut heap, &text, -1).unwrap();
    assert_eq!(&bytes[2..], b"I\"\x08abc\x07:\x06ET:\x07@ai\x06");

    let plain = heap.hash_new(Vec::new());
    heap.ivar_set(plain.as_object().unwrap(), "K", Value::True);
    let (dst, loaded) = roundtrip(&mut heap, &plain);
    assert!(!dst.hash(&loaded).unwrap().ruby2_keywords);
}
