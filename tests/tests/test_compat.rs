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

//! Class renames bridged by a compat registry.

use std::sync::Arc;

use marshal::{ClassId, CompatRegistry, Error, Heap, Marshal, Value};

/// `Meters` replaced `Feet`; old streams store feet.
fn schema(heap: &mut Heap) -> (ClassId, ClassId) {
    let object = heap.builtins().object;
    let meters = heap.define_class("Meters", object);
    let feet = heap.define_class("Feet", object);
    (meters, feet)
}

fn engine(meters: ClassId, feet: ClassId) -> Marshal {
    let mut registry = CompatRegistry::new();
    registry
        .define(
            meters,
            feet,
            move |heap: &mut Heap, real| {
                let m = heap.ivar_get(real, "@m").and_then(Value::as_integer).unwrap_or(0);
                let old = heap.allocate(feet)?;
                heap.ivar_set(old, "@ft", Value::Integer(m * 3));
                if let Some(link) = heap.ivar_get(real, "@self").cloned() {
                    heap.ivar_set(old, "@self", link);
                }
                Ok(old)
            },
            |heap: &mut Heap, real, old| {
                let ft = heap
                    .ivar_get(old, "@ft")
                    .and_then(Value::as_integer)
                    .ok_or_else(|| Error::invalid_data("feet missing"))?;
                heap.ivar_set(real, "@m", Value::Integer(ft / 3));
                if let Some(link) = heap.ivar_get(old, "@self").cloned() {
                    heap.ivar_set(real, "@self", link);
                }
                Ok(())
            },
        )
        .unwrap();
    Marshal::default().compat(Arc::new(registry))
}

#[test]
fn test_dump_writes_old_class() {
    let mut heap = Heap::new();
    let (meters, feet) = schema(&mut heap);
    let marshal = engine(meters, feet);
    let distance = heap.object_new(meters, vec![("@m", Value::Integer(2))]).unwrap();
    let bytes = marshal.dump(&mut heap, &distance).unwrap();
    assert_eq!(&bytes[2..], b"o:\x09Feet\x06:\x08@fti\x0b");
}

#[test]
fn test_load_converts_to_new_class() {
    let mut heap = Heap::new();
    let (meters, feet) = schema(&mut heap);
    let marshal = engine(meters, feet);
    let distance = heap.object_new(meters, vec![("@m", Value::Integer(7))]).unwrap();
    let bytes = marshal.dump(&mut heap, &distance).unwrap();

    let mut dst = Heap::new();
    let (meters, feet) = schema(&mut dst);
    let loaded = engine(meters, feet).load(&mut dst, &bytes).unwrap();
    let id = loaded.as_object().unwrap();
    assert_eq!(dst.get(id).class(), meters);
    assert_eq!(dst.ivar_get(id, "@m"), Some(&Value::Integer(7)));

    // Without the registry the old class comes back as is.
    let plain = Marshal::default().load(&mut dst, &bytes).unwrap();
    let id = plain.as_object().unwrap();
    assert_eq!(dst.get(id).class(), feet);
    assert_eq!(dst.ivar_get(id, "@ft"), Some(&Value::Integer(21)));
}

#[test]
fn test_links_resolve_to_converted_object() {
    let mut heap = Heap::new();
    let (meters, feet) = schema(&mut heap);
    let marshal = engine(meters, feet);
    let distance = heap.object_new(meters, vec![("@m", Value::Integer(1))]).unwrap();
    heap.ivar_set(distance.as_object().unwrap(), "@self", distance.clone());
    let list = heap.array_new(vec![distance.clone(), distance]);
    let bytes = marshal.dump(&mut heap, &list).unwrap();

    let mut dst = Heap::new();
    let (meters, feet) = schema(&mut dst);
    let loaded = engine(meters, feet).load(&mut dst, &bytes).unwrap();
    let items = dst.array(&loaded).unwrap().to_vec();
    assert_eq!(items[0], items[1]);
    let id = items[0].as_object().unwrap();
    assert_eq!(dst.get(id).class(), meters);
    assert_eq!(dst.ivar_get(id, "@self"), Some(&items[0]));
}
