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

//! Value graphs used by the marshal benchmarks.

use marshal::{ClassId, Heap, Symbol, Value};

/// Classes the log-entry model is built from.
pub struct LogSchema {
    pub entry: ClassId,
    pub span: ClassId,
}

impl LogSchema {
    pub fn define(heap: &mut Heap) -> LogSchema {
        let object = heap.builtins().object;
        LogSchema {
            entry: heap.define_class("LogEntry", object),
            span: heap.define_struct("Span", &["start", "end"]),
        }
    }
}

/// Flat array of small integers, floats and short strings.
pub fn flat_array(heap: &mut Heap, len: usize) -> Value {
    let mut items = Vec::with_capacity(len);
    for i in 0..len as i64 {
        items.push(match i % 3 {
            0 => Value::Integer(i),
            1 => Value::Float(i as f64 / 7.0),
            _ => heap.str_new(&format!("value-{}", i)),
        });
    }
    heap.array_new(items)
}

/// Log entries: plain objects with hash, array and struct children. Level
/// and service names repeat, so symbols and shared strings get linked.
pub fn log_entries(heap: &mut Heap, schema: &LogSchema, len: usize) -> Value {
    let services: Vec<Value> = ["auth", "billing", "search"]
        .iter()
        .map(|s| heap.str_new(s))
        .collect();
    let mut entries = Vec::with_capacity(len);
    for i in 0..len as i64 {
        let message = heap.str_new(&format!("request {} finished", i));
        let user = heap.str_new(&format!("user-{}", i % 50));
        let context = heap.hash_new(vec![
            (
                Value::Symbol(Symbol::new("request_id")),
                Value::Integer(i * 31),
            ),
            (Value::Symbol(Symbol::new("user")), user),
        ]);
        let tags = heap.array_new(vec![
            Value::Symbol(Symbol::new("http")),
            Value::Symbol(Symbol::new(if i % 2 == 0 { "slow" } else { "fast" })),
        ]);
        let span = heap
            .struct_new(
                schema.span,
                vec![Value::Integer(i * 1000), Value::Integer(i * 1000 + 17)],
            )
            .unwrap_or(Value::Nil);
        let entry = heap
            .object_new(
                schema.entry,
                vec![
                    ("@level", Value::Symbol(Symbol::new("info"))),
                    ("@message", message),
                    ("@service", services[i as usize % services.len()].clone()),
                    ("@context", context),
                    ("@tags", tags),
                    ("@span", span),
                    ("@duration", Value::Float(i as f64 * 0.25)),
                ],
            )
            .unwrap_or(Value::Nil);
        entries.push(entry);
    }
    heap.array_new(entries)
}

/// Ring of arrays, each pointing at the next, closed back to the first.
pub fn ring(heap: &mut Heap, len: usize) -> Value {
    let first = heap.array_new(Vec::new());
    let mut prev = first.clone();
    for i in 1..len as i64 {
        let node = heap.array_new(vec![Value::Integer(i)]);
        if let Some(id) = prev.as_object() {
            if let Some(items) = heap.array_mut(id) {
                items.push(node.clone());
            }
        }
        prev = node;
    }
    if let Some(id) = prev.as_object() {
        if let Some(items) = heap.array_mut(id) {
            items.push(first.clone());
        }
    }
    first
}
