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

use std::io::Read;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::Error;

/// Size of the codec word. Counted varints carry at most this many bytes.
pub const LONG_SIZE: usize = 4;

/// Upper bound on a single speculative read from a stream source.
pub const BUFSIZE: usize = 256;

#[derive(Default)]
pub struct Writer {
    pub(crate) bf: Vec<u8>,
}

impl Writer {
    pub fn reset(&mut self) {
        // keep capacity and reset len to 0
        self.bf.clear();
    }

    pub fn dump(&self) -> Vec<u8> {
        self.bf.clone()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bf
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bf
    }

    pub fn len(&self) -> usize {
        self.bf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bf.is_empty()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.bf.push(value);
    }

    pub fn write_bytes(&mut self, v: &[u8]) -> usize {
        self.bf.extend_from_slice(v);
        v.len()
    }

    pub fn write_u16(&mut self, value: u16) {
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, value);
        self.bf.extend_from_slice(&buf);
    }

    /// Writes a signed varint.
    ///
    /// `0` is a single zero byte, `1..=122` is `x + 5`, `-123..=-1` is
    /// `x - 5` as a byte. Anything else is a count byte `±n` followed by the
    /// `n` low bytes of `x` in little-endian order; negative numbers drop their
    /// leading `0xff` bytes.
    ///
    /// # Errors
    ///
    /// Values that need more than [`LONG_SIZE`] bytes cannot be told apart
    /// from the short forms on the wire and are rejected.
    pub fn write_long(&mut self, x: i64) -> Result<(), Error> {
        if x >> 31 != 0 && x >> 31 != -1 {
            return Err(Error::malformed_integer("long too big to dump"));
        }
        if x == 0 {
            self.write_u8(0);
            return Ok(());
        }
        if 0 < x && x < 123 {
            self.write_u8((x + 5) as u8);
            return Ok(());
        }
        if -124 < x && x < 0 {
            self.write_u8(((x - 5) & 0xff) as u8);
            return Ok(());
        }
        let mut buf = [0u8; LONG_SIZE + 1];
        let mut rest = x;
        for i in 1..=LONG_SIZE {
            buf[i] = (rest & 0xff) as u8;
            rest >>= 8;
            if rest == 0 {
                buf[0] = i as u8;
                self.write_bytes(&buf[..=i]);
                return Ok(());
            }
            if rest == -1 {
                buf[0] = (-(i as i8)) as u8;
                self.write_bytes(&buf[..=i]);
                return Ok(());
            }
        }
        Err(Error::malformed_integer("long too big to dump"))
    }

    /// Writes a varint length followed by the raw bytes.
    pub fn write_byte_string(&mut self, v: &[u8]) -> Result<(), Error> {
        self.write_long(v.len() as i64)?;
        self.write_bytes(v);
        Ok(())
    }
}

enum Source<'a> {
    Bytes(&'a [u8]),
    Stream {
        inner: &'a mut dyn Read,
        buf: Vec<u8>,
    },
}

/// Cursor over a complete byte slice or an incremental byte stream.
///
/// For streams the reader never pulls a byte that belongs to the next dump:
/// it only fetches what the current call needs plus the bytes the decoder has
/// already proven must follow (see [`Reader::expect`]), capped at [`BUFSIZE`].
pub struct Reader<'a> {
    source: Source<'a>,
    cursor: usize,
    readable: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bf: &'a [u8]) -> Reader<'a> {
        Reader {
            source: Source::Bytes(bf),
            cursor: 0,
            readable: 0,
        }
    }

    pub fn from_stream(inner: &'a mut dyn Read) -> Reader<'a> {
        Reader {
            source: Source::Stream {
                inner,
                buf: Vec::with_capacity(BUFSIZE),
            },
            cursor: 0,
            readable: 0,
        }
    }

    /// Bytes consumed so far from a slice source, or bytes left in the
    /// read-ahead buffer of a stream source.
    pub fn get_cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_stream(&self) -> bool {
        matches!(self.source, Source::Stream { .. })
    }

    /// Records that at least `n` more bytes belong to the value being read.
    ///
    /// Every count or length read from the input calls this, so the bound
    /// stays a true lower bound: an element is never shorter than one byte.
    #[inline(always)]
    pub fn expect(&mut self, n: usize) {
        self.readable = self.readable.saturating_add(n);
    }

    #[inline(always)]
    fn consumed(&mut self, n: usize) {
        self.readable = self.readable.saturating_sub(n);
    }

    /// Makes sure `n` bytes are available at the cursor of a stream source.
    ///
    /// The buffer grows by at most [`BUFSIZE`] per read, so a length claimed
    /// by the input costs memory only as its bytes arrive.
    fn fill(&mut self, n: usize) -> Result<(), Error> {
        let readable = self.readable;
        let Source::Stream { inner, buf } = &mut self.source else {
            return Ok(());
        };
        let buffered = buf.len() - self.cursor;
        if buffered >= n {
            return Ok(());
        }
        buf.drain(..self.cursor);
        self.cursor = 0;
        let need = n - buffered;
        let speculative = readable.min(BUFSIZE).saturating_sub(buffered);
        let mut remaining = need.max(speculative);
        while remaining > 0 {
            let chunk = remaining.min(BUFSIZE);
            let start = buf.len();
            buf.resize(start + chunk, 0);
            if let Err(err) = inner.read_exact(&mut buf[start..]) {
                buf.truncate(start);
                return Err(Error::from_read(err));
            }
            remaining -= chunk;
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        self.fill(1)?;
        let b = match &self.source {
            Source::Bytes(bf) => bf.get(self.cursor),
            Source::Stream { buf, .. } => buf.get(self.cursor),
        }
        .copied()
        .ok_or_else(Error::truncated)?;
        self.cursor += 1;
        self.consumed(1);
        Ok(b)
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        let bytes = self.read_bytes(2)?;
        Ok(LittleEndian::read_u16(&bytes))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        self.fill(len)?;
        let slice = match &self.source {
            Source::Bytes(bf) => bf.get(self.cursor..self.cursor.saturating_add(len)),
            Source::Stream { buf, .. } => buf.get(self.cursor..self.cursor + len),
        }
        .ok_or_else(Error::truncated)?;
        let bytes = slice.to_vec();
        self.cursor += len;
        self.consumed(len);
        Ok(bytes)
    }

    /// Reads a signed varint written by [`Writer::write_long`].
    pub fn read_long(&mut self) -> Result<i64, Error> {
        let c = self.read_u8()? as i8;
        if c == 0 {
            return Ok(0);
        }
        if c > 0 {
            if c > 4 {
                return Ok(c as i64 - 5);
            }
            let n = c as usize;
            self.check_long_size(n)?;
            self.expect(n);
            let mut x: i64 = 0;
            for i in 0..n {
                x |= (self.read_u8()? as i64) << (8 * i);
            }
            Ok(x)
        } else {
            if c < -4 {
                return Ok(c as i64 + 5);
            }
            let n = -(c as i64) as usize;
            self.check_long_size(n)?;
            self.expect(n);
            let mut x: i64 = -1;
            for i in 0..n {
                x &= !(0xff << (8 * i));
                x |= (self.read_u8()? as i64) << (8 * i);
            }
            Ok(x)
        }
    }

    #[inline(always)]
    fn check_long_size(&self, n: usize) -> Result<(), Error> {
        if n > LONG_SIZE {
            return Err(Error::malformed_integer(format!(
                "long too big for this architecture (size {}, given {})",
                LONG_SIZE, n
            )));
        }
        Ok(())
    }

    /// Reads a varint length followed by that many raw bytes.
    pub fn read_byte_string(&mut self) -> Result<Vec<u8>, Error> {
        let len = self.read_long()?;
        if len < 0 {
            return Err(Error::invalid_data("negative string size (or size too big)"));
        }
        let len = len as usize;
        self.expect(len);
        self.read_bytes(len)
    }
}
