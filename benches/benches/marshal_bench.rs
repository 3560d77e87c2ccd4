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

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use marshal::{Heap, Marshal, Value};
use marshal_benches::{flat_array, log_entries, ring, LogSchema};

fn bench_model(c: &mut Criterion, name: &str, heap: &mut Heap, value: &Value, schema: fn(&mut Heap)) {
    let marshal = Marshal::default();
    let bytes = marshal.dump(heap, value).unwrap();

    c.bench_function(&format!("{} dump ({} bytes)", name, bytes.len()), |b| {
        b.iter(|| marshal.dump(black_box(&mut *heap), black_box(value)).unwrap())
    });

    c.bench_function(&format!("{} load", name), |b| {
        b.iter(|| {
            let mut dst = Heap::new();
            schema(&mut dst);
            marshal.load(&mut dst, black_box(&bytes)).unwrap()
        })
    });

    c.bench_function(&format!("{} load stream", name), |b| {
        b.iter(|| {
            let mut dst = Heap::new();
            schema(&mut dst);
            let mut src = std::io::Cursor::new(black_box(&bytes));
            marshal.load_from(&mut dst, &mut src).unwrap()
        })
    });
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut heap = Heap::new();
    let value = flat_array(&mut heap, 1000);
    bench_model(c, "flat_array", &mut heap, &value, |_| {});

    let mut heap = Heap::new();
    let schema = LogSchema::define(&mut heap);
    let value = log_entries(&mut heap, &schema, 200);
    bench_model(c, "log_entries", &mut heap, &value, |heap| {
        LogSchema::define(heap);
    });

    let mut heap = Heap::new();
    let value = ring(&mut heap, 1000);
    bench_model(c, "ring", &mut heap, &value, |_| {});
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
