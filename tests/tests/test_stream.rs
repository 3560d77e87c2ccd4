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

use std::io::{Cursor, Read};

use marshal::{Error, Heap, Marshal, Value};

/// Counts how many bytes were pulled from the inner reader and the largest
/// buffer it was asked to fill.
struct Metered<R> {
    inner: R,
    pulled: usize,
    widest: usize,
}

impl<R> Metered<R> {
    fn new(inner: R) -> Self {
        Metered {
            inner,
            pulled: 0,
            widest: 0,
        }
    }
}

impl<R: Read> Read for Metered<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.widest = self.widest.max(buf.len());
        let n = self.inner.read(buf)?;
        self.pulled += n;
        Ok(n)
    }
}

#[test]
fn test_consecutive_dumps_from_one_stream() {
    let marshal = Marshal::default();
    let mut heap = Heap::new();
    let s = heap.str_new("first");
    let list = heap.array_new(vec![s, Value::Integer(300)]);

    let mut out = Vec::new();
    marshal.dump_to(&mut heap, &list, &mut out).unwrap();
    let first_len = out.len();
    marshal.dump_to(&mut heap, &Value::Integer(42), &mut out).unwrap();

    let mut src = Metered::new(Cursor::new(out.clone()));
    let mut dst = Heap::new();
    let first = marshal.load_from(&mut dst, &mut src).unwrap();
    assert_eq!(src.pulled, first_len);
    let items = dst.array(&first).unwrap();
    assert_eq!(dst.string(&items[0]).unwrap().as_str(), Some("first"));
    assert_eq!(items[1], Value::Integer(300));

    let second = marshal.load_from(&mut dst, &mut src).unwrap();
    assert_eq!(second, Value::Integer(42));
    assert_eq!(src.pulled, out.len());
}

#[test]
fn test_stream_and_slice_agree() {
    let mut heap = Heap::new();
    let object = heap.builtins().object;
    let item = heap.define_class("Item", object);
    let mut items = Vec::new();
    for i in 0..100 {
        let name = heap.str_new(&format!("item-{}", i));
        items.push(heap.object_new(item, vec![("@name", name), ("@n", Value::Integer(i))]).unwrap());
    }
    let list = heap.array_new(items);
    let bytes = marshal::dump(&mut heap, &list, -1).unwrap();

    let marshal = Marshal::default();
    let mut a = Heap::new();
    a.define_class("Item", a.builtins().object);
    let from_slice = marshal.load(&mut a, &bytes).unwrap();
    let mut b = Heap::new();
    b.define_class("Item", b.builtins().object);
    let from_stream = marshal.load_from(&mut b, &mut Cursor::new(&bytes)).unwrap();

    assert_eq!(
        marshal::dump(&mut a, &from_slice, -1).unwrap(),
        marshal::dump(&mut b, &from_stream, -1).unwrap()
    );
}

#[test]
fn test_short_stream_is_truncated() {
    if marshal_core::error::should_panic_on_error() {
        return;
    }
    let mut heap = Heap::new();
    let s = heap.str_new("cut short");
    let bytes = marshal::dump(&mut heap, &s, -1).unwrap();
    let mut src = Cursor::new(&bytes[..bytes.len() - 3]);
    let err = Marshal::default()
        .load_from(&mut Heap::new(), &mut src)
        .unwrap_err();
    assert!(matches!(err, Error::Truncated));
}

#[test]
fn test_claimed_length_does_not_preallocate() {
    if marshal_core::error::should_panic_on_error() {
        return;
    }
    // A string that claims 0x3ffffff0 bytes but carries three.
    let bytes = b"\x04\x08\"\x04\xf0\xff\xff\x3fabc";
    let mut src = Metered::new(Cursor::new(&bytes[..]));
    let err = Marshal::default()
        .load_from(&mut Heap::new(), &mut src)
        .unwrap_err();
    assert!(matches!(err, Error::Truncated));
    assert_eq!(src.pulled, bytes.len());
    assert!(src.widest <= marshal_core::buffer::BUFSIZE, "widest read {}", src.widest);
}
