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

use num_bigint::{BigInt, Sign};

use crate::error::Error;
use crate::object::{ObjectId, Value};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::types::{Tag, FIXNUM_MAX, FIXNUM_MIN};

pub(crate) fn write_integer(context: &mut WriteContext, v: i64) -> Result<(), Error> {
    if (FIXNUM_MIN..=FIXNUM_MAX).contains(&v) {
        context.write_tag(Tag::Fixnum);
        return context.writer.write_long(v);
    }
    // Out-of-word integers become a fresh bignum each time.
    context.ref_writer.skip();
    write_bignum(context, &BigInt::from(v))
}

pub(crate) fn write_bignum_object(context: &mut WriteContext, id: ObjectId) -> Result<(), Error> {
    let value = Value::Object(id);
    match context.heap.bignum(&value) {
        Some(big) => {
            let big = big.clone();
            write_bignum(context, &big)
        }
        None => Err(Error::invalid_data("bignum payload expected")),
    }
}

/// `l`, sign byte, number of 16-bit groups, then the groups least significant first.
fn write_bignum(context: &mut WriteContext, big: &BigInt) -> Result<(), Error> {
    let (sign, bytes) = big.to_bytes_le();
    context.write_tag(Tag::Bignum);
    context
        .writer
        .write_u8(if sign == Sign::Minus { b'-' } else { b'+' });
    context.writer.write_long(((bytes.len() + 1) / 2) as i64)?;
    for chunk in bytes.chunks(2) {
        let lo = u16::from(chunk[0]);
        let hi = chunk.get(1).map_or(0, |b| u16::from(*b));
        context.writer.write_u16(lo | hi << 8);
    }
    Ok(())
}

pub(crate) fn read_bignum(context: &mut ReadContext) -> Result<Value, Error> {
    let sign = context.reader.read_u8()?;
    let len = context.reader.read_long()?;
    if len < 0 {
        return Err(Error::invalid_data("negative bignum size"));
    }
    let nbytes = (len as usize).saturating_mul(2);
    context.reader.expect(nbytes);
    let bytes = context.reader.read_bytes(nbytes)?;
    let sign = if sign == b'-' { Sign::Minus } else { Sign::Plus };
    let value = context.heap.integer_new(BigInt::from_bytes_le(sign, &bytes));
    context.ref_reader.store(value.clone());
    context.leave(value, false)
}

pub(crate) fn write_float(context: &mut WriteContext, v: f64) -> Result<(), Error> {
    context.ref_writer.skip();
    context.write_tag(Tag::Float);
    context.writer.write_byte_string(format_float(v).as_bytes())
}

pub(crate) fn read_float(context: &mut ReadContext) -> Result<Value, Error> {
    let bytes = context.reader.read_byte_string()?;
    let value = Value::Float(parse_float(&bytes)?);
    context.ref_reader.store(value.clone());
    context.leave(value, false)
}

/// Shortest text that reads back to the same double.
///
/// Plain notation is used while the decimal point sits at most three places
/// left of the first digit and no further right than the last one; anything
/// else is written as `d[.ddd]e<exp>`.
///
/// ```
/// use marshal_core::serializer::number::format_float;
///
/// assert_eq!(format_float(1.5), "1.5");
/// assert_eq!(format_float(100.0), "1e2");
/// assert_eq!(format_float(0.001), "0.001");
/// assert_eq!(format_float(1e-5), "1e-5");
/// assert_eq!(format_float(-0.0), "-0");
/// ```
pub fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let sci = format!("{:e}", v.abs());
    let (mantissa, exp) = match sci.split_once('e') {
        Some(parts) => parts,
        None => (sci.as_str(), "0"),
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let digs = digits.len() as i32;
    let decpt = exp + 1;

    let mut out = String::with_capacity(digits.len() + 8);
    if v < 0.0 {
        out.push('-');
    }
    if decpt < -3 || decpt > digs {
        out.push_str(&digits[..1]);
        if digs > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        out.push('e');
        out.push_str(&(decpt - 1).to_string());
    } else if decpt > 0 {
        let split = decpt as usize;
        out.push_str(&digits[..split]);
        if split < digits.len() {
            out.push('.');
            out.push_str(&digits[split..]);
        }
    } else {
        out.push_str("0.");
        for _ in 0..-decpt {
            out.push('0');
        }
        out.push_str(&digits);
    }
    out
}

/// Reads float text up to the first NUL byte.
pub fn parse_float(bytes: &[u8]) -> Result<f64, Error> {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    let text = std::str::from_utf8(&bytes[..end])
        .map_err(|_| Error::invalid_data("float text is not ascii"))?;
    match text {
        "nan" => Ok(f64::NAN),
        "inf" => Ok(f64::INFINITY),
        "-inf" => Ok(f64::NEG_INFINITY),
        _ => text
            .parse::<f64>()
            .map_err(|_| Error::invalid_data(format!("invalid float {:?}", text))),
    }
}
