//! # Commit Reader
//!
//! Forward cursor over a [`Buffer`]. The cursor decodes one entry at a time,
//! tracking the running absolute offset of the current chunk span and the
//! byte bounds of the current payload. Those bounds are what make in-place
//! value rewriting ("swap") possible: a fixed-width payload can be
//! overwritten without touching the entry's type byte or offset encoding.
//!
//! ## Scopes
//!
//! [`Reader::seek`] iterates every entry in the buffer in write order.
//! [`Reader::range`] restricts iteration to the spans of a single chunk, so
//! a replay can process one 16k-row partition without decoding the rest of
//! the log. [`Reader::rewind`] returns to the beginning of whichever scope
//! the cursor was created with.
//!
//! ## Typed Extraction
//!
//! Exact-width accessors (`get_i16`, `get_u64`, ...) require the entry's
//! payload tag to match. Widening accessors accept any compatible tag:
//! `get_int` widens signed integers to i64, `get_uint` unsigned to u64,
//! `get_float` either float width to f64, and `get_number` any numeric tag
//! to f64. A tag the accessor cannot coerce is a caller bug and fails with
//! an error rather than a silent reinterpretation.

use eyre::{bail, ensure, Result};

use super::buffer::Span;
use super::{pack_type, unpack_type, Buffer, Chunk, Op, Tag, FIRST_BIT};
use crate::encoding::decode_varint;
use crate::types::Value;

/// Cursor over a commit buffer. Holds no heap state; it borrows the buffer
/// for the duration of the scan.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a mut [u8],
    spans: &'a [Span],
    scope: Option<Chunk>,
    span_idx: usize,
    /// Byte position of the next entry to decode.
    head: usize,
    /// Byte position of the current entry's type byte.
    entry: usize,
    /// Payload bounds of the current entry.
    i0: usize,
    i1: usize,
    op: Op,
    tag: Tag,
    offset: u32,
}

impl<'a> Reader<'a> {
    /// Attaches to a buffer, positioned before its first entry.
    pub fn seek(buffer: &'a mut Buffer) -> Self {
        Self::attach(buffer, None)
    }

    /// Runs `visit` with a cursor scoped to a single chunk: `next` yields
    /// the entries of that chunk and only that chunk, in write order.
    pub fn range(buffer: &'a mut Buffer, chunk: Chunk, visit: impl FnOnce(&mut Reader<'a>)) {
        let mut reader = Self::attach(buffer, Some(chunk));
        visit(&mut reader);
    }

    fn attach(buffer: &'a mut Buffer, scope: Option<Chunk>) -> Self {
        let (data, spans) = buffer.parts_mut();
        let mut reader = Reader {
            data,
            spans,
            scope,
            span_idx: 0,
            head: 0,
            entry: 0,
            i0: 0,
            i1: 0,
            op: Op::Put,
            tag: Tag::Nil,
            offset: 0,
        };
        reader.rewind();
        reader
    }

    /// Returns the cursor to the beginning of the current seek/range scope.
    pub fn rewind(&mut self) {
        self.span_idx = 0;
        self.skip_unscoped_spans();
        self.head = self.span_start(self.span_idx);
        self.entry = self.head;
        self.i0 = 0;
        self.i1 = 0;
        self.op = Op::Put;
        self.tag = Tag::Nil;
        self.offset = 0;
    }

    /// Advances to the next entry in scope, decoding its operation, payload
    /// bounds, and absolute offset. Returns false at the end of the scope.
    pub fn next(&mut self) -> bool {
        loop {
            if self.span_idx >= self.spans.len() {
                return false;
            }
            if self.head >= self.span_end(self.span_idx) {
                self.span_idx += 1;
                self.skip_unscoped_spans();
                self.head = self.span_start(self.span_idx);
                continue;
            }
            self.decode_entry();
            return true;
        }
    }

    /// Operation of the current entry.
    pub fn op(&self) -> Op {
        self.op
    }

    /// Absolute row offset of the current entry.
    pub fn index(&self) -> u32 {
        self.offset
    }

    pub fn get_bool(&self) -> Result<bool> {
        match self.tag {
            Tag::BoolTrue => Ok(true),
            Tag::BoolFalse => Ok(false),
            other => bail!("cannot read {:?} entry as bool", other),
        }
    }

    pub fn get_i16(&self) -> Result<i16> {
        ensure!(self.tag == Tag::I16, "cannot read {:?} entry as i16", self.tag);
        Ok(i16::from_le_bytes(self.payload_array()?))
    }

    pub fn get_i32(&self) -> Result<i32> {
        ensure!(self.tag == Tag::I32, "cannot read {:?} entry as i32", self.tag);
        Ok(i32::from_le_bytes(self.payload_array()?))
    }

    pub fn get_i64(&self) -> Result<i64> {
        ensure!(self.tag == Tag::I64, "cannot read {:?} entry as i64", self.tag);
        Ok(i64::from_le_bytes(self.payload_array()?))
    }

    pub fn get_u16(&self) -> Result<u16> {
        ensure!(self.tag == Tag::U16, "cannot read {:?} entry as u16", self.tag);
        Ok(u16::from_le_bytes(self.payload_array()?))
    }

    pub fn get_u32(&self) -> Result<u32> {
        ensure!(self.tag == Tag::U32, "cannot read {:?} entry as u32", self.tag);
        Ok(u32::from_le_bytes(self.payload_array()?))
    }

    pub fn get_u64(&self) -> Result<u64> {
        ensure!(self.tag == Tag::U64, "cannot read {:?} entry as u64", self.tag);
        Ok(u64::from_le_bytes(self.payload_array()?))
    }

    pub fn get_f32(&self) -> Result<f32> {
        ensure!(self.tag == Tag::F32, "cannot read {:?} entry as f32", self.tag);
        Ok(f32::from_le_bytes(self.payload_array()?))
    }

    pub fn get_f64(&self) -> Result<f64> {
        ensure!(self.tag == Tag::F64, "cannot read {:?} entry as f64", self.tag);
        Ok(f64::from_le_bytes(self.payload_array()?))
    }

    pub fn get_str(&self) -> Result<&str> {
        ensure!(
            self.tag == Tag::Str,
            "cannot read {:?} entry as string",
            self.tag
        );
        std::str::from_utf8(&self.data[self.i0..self.i1])
            .map_err(|e| eyre::eyre!("invalid utf-8 in string entry: {}", e))
    }

    pub fn get_bytes(&self) -> Result<&[u8]> {
        ensure!(
            self.tag == Tag::Bytes,
            "cannot read {:?} entry as bytes",
            self.tag
        );
        Ok(&self.data[self.i0..self.i1])
    }

    /// Widens any stored signed or native integer to i64.
    pub fn get_int(&self) -> Result<i64> {
        match self.tag {
            Tag::I16 => Ok(i64::from(i16::from_le_bytes(self.payload_array()?))),
            Tag::I32 => Ok(i64::from(i32::from_le_bytes(self.payload_array()?))),
            Tag::I64 | Tag::Int => Ok(i64::from_le_bytes(self.payload_array()?)),
            other => bail!("cannot read {:?} entry as a signed integer", other),
        }
    }

    /// Widens any stored unsigned or native integer to u64.
    pub fn get_uint(&self) -> Result<u64> {
        match self.tag {
            Tag::U16 => Ok(u64::from(u16::from_le_bytes(self.payload_array()?))),
            Tag::U32 => Ok(u64::from(u32::from_le_bytes(self.payload_array()?))),
            Tag::U64 | Tag::Uint => Ok(u64::from_le_bytes(self.payload_array()?)),
            other => bail!("cannot read {:?} entry as an unsigned integer", other),
        }
    }

    /// Widens either stored float width to f64.
    pub fn get_float(&self) -> Result<f64> {
        match self.tag {
            Tag::F32 => Ok(f64::from(f32::from_le_bytes(self.payload_array()?))),
            Tag::F64 => Ok(f64::from_le_bytes(self.payload_array()?)),
            other => bail!("cannot read {:?} entry as a float", other),
        }
    }

    /// Widens any numeric tag to f64.
    pub fn get_number(&self) -> Result<f64> {
        match self.tag {
            Tag::F32 | Tag::F64 => self.get_float(),
            Tag::I16 | Tag::I32 | Tag::I64 | Tag::Int => Ok(self.get_int()? as f64),
            Tag::U16 | Tag::U32 | Tag::U64 | Tag::Uint => Ok(self.get_uint()? as f64),
            other => bail!("cannot read {:?} entry as a number", other),
        }
    }

    /// Reconstructs the current entry's payload as a boundary value.
    pub fn value(&self) -> Result<Value> {
        Ok(match self.tag {
            Tag::Nil => bail!("entry carries no value payload"),
            Tag::BoolFalse => Value::Bool(false),
            Tag::BoolTrue => Value::Bool(true),
            Tag::I16 => Value::Int16(self.get_i16()?),
            Tag::I32 => Value::Int32(self.get_i32()?),
            Tag::I64 => Value::Int64(self.get_i64()?),
            Tag::U16 => Value::Uint16(self.get_u16()?),
            Tag::U32 => Value::Uint32(self.get_u32()?),
            Tag::U64 => Value::Uint64(self.get_u64()?),
            Tag::Int => Value::Int(i64::from_le_bytes(self.payload_array()?) as isize),
            Tag::Uint => Value::Uint(u64::from_le_bytes(self.payload_array()?) as usize),
            Tag::F32 => Value::Float32(self.get_f32()?),
            Tag::F64 => Value::Float64(self.get_f64()?),
            Tag::Str => Value::String(self.get_str()?.to_string()),
            Tag::Bytes => Value::Bytes(self.get_bytes()?.to_vec()),
        })
    }

    pub fn swap_i16(&mut self, value: i16) -> Result<()> {
        ensure!(
            self.tag == Tag::I16,
            "cannot swap an i16 into {:?} entry",
            self.tag
        );
        self.data[self.i0..self.i1].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn swap_i32(&mut self, value: i32) -> Result<()> {
        ensure!(
            self.tag == Tag::I32,
            "cannot swap an i32 into {:?} entry",
            self.tag
        );
        self.data[self.i0..self.i1].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn swap_i64(&mut self, value: i64) -> Result<()> {
        ensure!(
            self.tag == Tag::I64,
            "cannot swap an i64 into {:?} entry",
            self.tag
        );
        self.data[self.i0..self.i1].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn swap_u16(&mut self, value: u16) -> Result<()> {
        ensure!(
            self.tag == Tag::U16,
            "cannot swap a u16 into {:?} entry",
            self.tag
        );
        self.data[self.i0..self.i1].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn swap_u32(&mut self, value: u32) -> Result<()> {
        ensure!(
            self.tag == Tag::U32,
            "cannot swap a u32 into {:?} entry",
            self.tag
        );
        self.data[self.i0..self.i1].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn swap_u64(&mut self, value: u64) -> Result<()> {
        ensure!(
            self.tag == Tag::U64,
            "cannot swap a u64 into {:?} entry",
            self.tag
        );
        self.data[self.i0..self.i1].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Swaps a platform-native signed integer; the entry keeps its 8-byte
    /// wire width.
    pub fn swap_int(&mut self, value: isize) -> Result<()> {
        ensure!(
            self.tag == Tag::Int,
            "cannot swap an int into {:?} entry",
            self.tag
        );
        self.data[self.i0..self.i1].copy_from_slice(&(value as i64).to_le_bytes());
        Ok(())
    }

    /// Swaps a platform-native unsigned integer; the entry keeps its 8-byte
    /// wire width.
    pub fn swap_uint(&mut self, value: usize) -> Result<()> {
        ensure!(
            self.tag == Tag::Uint,
            "cannot swap a uint into {:?} entry",
            self.tag
        );
        self.data[self.i0..self.i1].copy_from_slice(&(value as u64).to_le_bytes());
        Ok(())
    }

    pub fn swap_f32(&mut self, value: f32) -> Result<()> {
        ensure!(
            self.tag == Tag::F32,
            "cannot swap an f32 into {:?} entry",
            self.tag
        );
        self.data[self.i0..self.i1].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn swap_f64(&mut self, value: f64) -> Result<()> {
        ensure!(
            self.tag == Tag::F64,
            "cannot swap an f64 into {:?} entry",
            self.tag
        );
        self.data[self.i0..self.i1].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Alias for swapping into an f64 entry.
    pub fn swap_number(&mut self, value: f64) -> Result<()> {
        ensure!(
            self.tag == Tag::F64,
            "cannot swap a number into {:?} entry",
            self.tag
        );
        self.data[self.i0..self.i1].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// The bool value lives in the type byte, so this rewrites the tag bits
    /// in place; the span flag, operation, and offset encoding are
    /// untouched.
    pub fn swap_bool(&mut self, value: bool) -> Result<()> {
        ensure!(
            matches!(self.tag, Tag::BoolTrue | Tag::BoolFalse),
            "cannot swap a bool into {:?} entry",
            self.tag
        );
        let tag = if value { Tag::BoolTrue } else { Tag::BoolFalse };
        let first = self.data[self.entry] & FIRST_BIT != 0;
        self.data[self.entry] = pack_type(first, self.op, tag);
        self.tag = tag;
        Ok(())
    }

    fn skip_unscoped_spans(&mut self) {
        if let Some(chunk) = self.scope {
            while let Some(span) = self.spans.get(self.span_idx) {
                if span.chunk == chunk {
                    break;
                }
                self.span_idx += 1;
            }
        }
    }

    fn span_start(&self, idx: usize) -> usize {
        self.spans.get(idx).map_or(self.data.len(), |s| s.start)
    }

    fn span_end(&self, idx: usize) -> usize {
        self.spans.get(idx + 1).map_or(self.data.len(), |s| s.start)
    }

    fn decode_entry(&mut self) {
        // INVARIANT: the byte stream was produced by Buffer, so every
        // decode below operates on a well-formed entry.
        let pos = self.head;
        self.entry = pos;
        let (first, op, tag) =
            unpack_type(self.data[pos]).expect("corrupted type byte in commit buffer");

        let mut cur = pos + 1;
        if first {
            let bytes: [u8; 4] = self.data[cur..cur + 4]
                .try_into()
                .expect("corrupted span base in commit buffer");
            self.offset = u32::from_le_bytes(bytes);
            cur += 4;
        } else {
            let (delta, n) =
                decode_varint(&self.data[cur..]).expect("corrupted offset delta in commit buffer");
            self.offset += delta as u32;
            cur += n;
        }

        let (i0, i1) = match tag.payload_len() {
            Some(len) => (cur, cur + len),
            None => {
                let (len, n) = decode_varint(&self.data[cur..])
                    .expect("corrupted length prefix in commit buffer");
                (cur + n, cur + n + len as usize)
            }
        };

        self.op = op;
        self.tag = tag;
        self.i0 = i0;
        self.i1 = i1;
        self.head = i1;
    }

    fn payload_array<const N: usize>(&self) -> Result<[u8; N]> {
        self.data[self.i0..self.i1].try_into().map_err(|_| {
            eyre::eyre!(
                "entry payload is {} bytes, expected {}",
                self.i1 - self.i0,
                N
            )
        })
    }
}
