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

use marshal_core::buffer::{Reader, Writer};
use marshal_core::error::Error;

#[test]
fn test_long_short_forms() {
    let test_data: Vec<(i64, Vec<u8>)> = vec![
        // zero
        (0, vec![0x00]),
        // 1..122 are offset by 5
        (1, vec![0x06]),
        (122, vec![0x7f]),
        // -123..-1 are offset by -5
        (-1, vec![0xfa]),
        (-123, vec![0x80]),
    ];
    for (data, expected) in &test_data {
        let mut writer = Writer::default();
        writer.write_long(*data).unwrap();
        assert_eq!(&writer.dump(), expected, "{}", data);
    }
}

#[test]
fn test_long_counted_forms() {
    let test_data: Vec<i64> = vec![
        // 1 byte
        123,
        255,
        -124,
        -256,
        // 2 bytes
        256,
        65_535,
        -257,
        -65_536,
        // 3 bytes
        65_536,
        16_777_215,
        -65_537,
        // 4 bytes
        16_777_216,
        i32::MAX as i64,
        i32::MIN as i64,
    ];
    for &data in &test_data {
        let mut writer = Writer::default();
        writer.write_long(data).unwrap();
        let binding = writer.dump();
        let count = binding[0] as i8;
        assert_eq!(count.unsigned_abs() as usize, binding.len() - 1);
        assert_eq!(count > 0, data > 0);
        let mut reader = Reader::new(binding.as_slice());
        assert_eq!(reader.read_long().unwrap(), data);
        assert_eq!(reader.get_cursor(), binding.len());
    }
}

#[test]
fn test_long_outside_codec_word() {
    if marshal_core::error::should_panic_on_error() {
        return;
    }
    for data in [i32::MAX as i64 + 1, i32::MIN as i64 - 1, i64::MAX] {
        let mut writer = Writer::default();
        let err = writer.write_long(data).unwrap_err();
        assert!(matches!(err, Error::MalformedInteger(_)));
        assert_eq!(err.to_string(), "long too big to dump");
    }
}

#[test]
fn test_byte_string() {
    let mut writer = Writer::default();
    writer.write_byte_string(b"").unwrap();
    writer.write_byte_string(b"abc").unwrap();
    writer.write_byte_string(&[7u8; 300]).unwrap();
    let binding = writer.dump();
    assert_eq!(&binding[..5], &[0x00, 0x08, b'a', b'b', b'c']);

    let mut reader = Reader::new(binding.as_slice());
    assert_eq!(reader.read_byte_string().unwrap(), b"");
    assert_eq!(reader.read_byte_string().unwrap(), b"abc");
    assert_eq!(reader.read_byte_string().unwrap(), vec![7u8; 300]);
}

#[test]
fn test_u16_little_endian() {
    let mut writer = Writer::default();
    writer.write_u16(0x1234);
    assert_eq!(writer.dump(), vec![0x34, 0x12]);
    let binding = writer.dump();
    let mut reader = Reader::new(binding.as_slice());
    assert_eq!(reader.read_u16().unwrap(), 0x1234);
}

#[test]
fn test_reader_truncation() {
    if marshal_core::error::should_panic_on_error() {
        return;
    }
    let mut reader = Reader::new(&[0x02, 0x01]);
    assert!(matches!(reader.read_long(), Err(Error::Truncated)));

    let mut reader = Reader::new(&[0x0a, b'a']);
    assert!(matches!(reader.read_byte_string(), Err(Error::Truncated)));
}
