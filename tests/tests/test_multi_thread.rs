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

use std::collections::HashSet;
use std::thread;

use marshal::{Heap, Marshal, Value};

#[test]
fn test_engine_clone_per_thread() {
    let marshal = Marshal::default().depth_limit(16);
    let src: HashSet<i64> = [41, 42, 43, 45, 46, 47].into_iter().collect();
    // dump
    let mut handles = vec![];
    for item in &src {
        let marshal = marshal.clone();
        let item = *item;
        let handle = thread::spawn(move || {
            let mut heap = Heap::new();
            let s = heap.str_new(&item.to_string());
            let value = heap.array_new(vec![Value::Integer(item), s]);
            marshal.dump(&mut heap, &value).unwrap()
        });
        handles.push(handle);
    }
    let mut dumped = vec![];
    for handle in handles {
        dumped.push(handle.join().unwrap());
    }
    // load
    let mut handles = vec![];
    for bytes in dumped {
        let marshal = marshal.clone();
        let handle = thread::spawn(move || {
            let mut heap = Heap::new();
            let value = marshal.load(&mut heap, &bytes).unwrap();
            let items = heap.array(&value).unwrap();
            let text = heap.string(&items[1]).unwrap().as_str().unwrap().to_string();
            assert_eq!(text, items[0].as_integer().unwrap().to_string());
            items[0].as_integer().unwrap()
        });
        handles.push(handle);
    }
    let dest: HashSet<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(dest, src);
}

#[test]
fn test_heap_moves_between_threads() {
    let mut heap = Heap::new();
    let shared = heap.str_new("shared");
    let value = heap.array_new(vec![shared.clone(), shared]);
    let (heap, bytes) = thread::spawn(move || {
        let bytes = Marshal::default().dump(&mut heap, &value).unwrap();
        (heap, bytes)
    })
    .join()
    .unwrap();
    assert!(heap.object_count() >= 2);
    let mut dst = Heap::new();
    let loaded = Marshal::default().load(&mut dst, &bytes).unwrap();
    let items = dst.array(&loaded).unwrap();
    assert_eq!(items[0], items[1]);
}
