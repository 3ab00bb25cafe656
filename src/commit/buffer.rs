//! # Commit Buffer
//!
//! Append-only, chunk-partitioned operation log. Mutations against row
//! handles are serialized per 16k-row chunk with delta-compressed offsets
//! and variable-width payloads; a [`Reader`](super::Reader) replays them.
//!
//! ## Span Bookkeeping
//!
//! The buffer keeps one `Span` per contiguous run of same-chunk writes:
//! the chunk id, the byte position of the run's first entry, and the last
//! offset written (the delta base). Appending to the current span is O(1).
//! A chunk revisited after writes to another chunk gets a fresh span, as
//! does a same-chunk write below the delta base, so encoded deltas are
//! always non-negative.
//!
//! ## Reuse
//!
//! `reset` clears all entries and records the property name the buffer
//! targets, keeping allocations for the next fill. Buffers are produced by
//! writers and consumed by readers; they are not internally synchronized.

use smallvec::SmallVec;

use super::{pack_type, Chunk, Op, Tag};
use crate::config::DEFAULT_BUFFER_CAPACITY;
use crate::encoding::{encode_varint, MAX_VARINT_LEN};
use crate::types::Value;

/// One contiguous run of same-chunk entries.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Span {
    pub(crate) chunk: Chunk,
    /// Byte position of the span's first entry.
    pub(crate) start: usize,
    /// Last absolute row offset written; the delta base for the next entry.
    pub(crate) last: u32,
}

/// Delta-encoded operation log, grouped by chunk.
#[derive(Debug)]
pub struct Buffer {
    name: String,
    data: Vec<u8>,
    spans: SmallVec<[Span; 4]>,
}

impl Buffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }

    /// Allocates with a byte-capacity hint.
    pub fn with_capacity(hint: usize) -> Self {
        Self {
            name: String::new(),
            data: Vec::with_capacity(hint),
            spans: SmallVec::new(),
        }
    }

    /// Clears all entries and records the property name the buffer targets.
    /// Allocations are kept for reuse.
    pub fn reset(&mut self, name: &str) {
        self.name.clear();
        self.name.push_str(name);
        self.data.clear();
        self.spans.clear();
    }

    /// Property name recorded by the last `reset`, or empty.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True iff no entries have been written since creation or last `reset`.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn put_bool(&mut self, offset: u32, value: bool) {
        let tag = if value { Tag::BoolTrue } else { Tag::BoolFalse };
        self.push_header(Op::Put, tag, offset);
    }

    pub fn put_i16(&mut self, offset: u32, value: i16) {
        self.push_header(Op::Put, Tag::I16, offset);
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_i32(&mut self, offset: u32, value: i32) {
        self.push_header(Op::Put, Tag::I32, offset);
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_i64(&mut self, offset: u32, value: i64) {
        self.push_header(Op::Put, Tag::I64, offset);
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_u16(&mut self, offset: u32, value: u16) {
        self.push_header(Op::Put, Tag::U16, offset);
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_u32(&mut self, offset: u32, value: u32) {
        self.push_header(Op::Put, Tag::U32, offset);
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_u64(&mut self, offset: u32, value: u64) {
        self.push_header(Op::Put, Tag::U64, offset);
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Platform-native signed integer; encoded as 8 bytes on the wire.
    pub fn put_int(&mut self, offset: u32, value: isize) {
        self.push_header(Op::Put, Tag::Int, offset);
        self.data.extend_from_slice(&(value as i64).to_le_bytes());
    }

    /// Platform-native unsigned integer; encoded as 8 bytes on the wire.
    pub fn put_uint(&mut self, offset: u32, value: usize) {
        self.push_header(Op::Put, Tag::Uint, offset);
        self.data.extend_from_slice(&(value as u64).to_le_bytes());
    }

    pub fn put_f32(&mut self, offset: u32, value: f32) {
        self.push_header(Op::Put, Tag::F32, offset);
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_f64(&mut self, offset: u32, value: f64) {
        self.push_header(Op::Put, Tag::F64, offset);
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_str(&mut self, offset: u32, value: &str) {
        self.push_header(Op::Put, Tag::Str, offset);
        self.push_len(value.len());
        self.data.extend_from_slice(value.as_bytes());
    }

    pub fn put_bytes(&mut self, offset: u32, value: &[u8]) {
        self.push_header(Op::Put, Tag::Bytes, offset);
        self.push_len(value.len());
        self.data.extend_from_slice(value);
    }

    /// Writes a zero-payload delete entry for the given row.
    pub fn delete(&mut self, offset: u32) {
        self.push_header(Op::Delete, Tag::Nil, offset);
    }

    /// Dispatches on the runtime value variant. The `Value` enum is closed
    /// over exactly the encodable set, so every variant has a wire form.
    pub fn put_any(&mut self, op: Op, offset: u32, value: &Value) {
        match value {
            Value::Bool(v) => {
                let tag = if *v { Tag::BoolTrue } else { Tag::BoolFalse };
                self.push_header(op, tag, offset);
            }
            Value::Int16(v) => {
                self.push_header(op, Tag::I16, offset);
                self.data.extend_from_slice(&v.to_le_bytes());
            }
            Value::Int32(v) => {
                self.push_header(op, Tag::I32, offset);
                self.data.extend_from_slice(&v.to_le_bytes());
            }
            Value::Int64(v) => {
                self.push_header(op, Tag::I64, offset);
                self.data.extend_from_slice(&v.to_le_bytes());
            }
            Value::Uint16(v) => {
                self.push_header(op, Tag::U16, offset);
                self.data.extend_from_slice(&v.to_le_bytes());
            }
            Value::Uint32(v) => {
                self.push_header(op, Tag::U32, offset);
                self.data.extend_from_slice(&v.to_le_bytes());
            }
            Value::Uint64(v) => {
                self.push_header(op, Tag::U64, offset);
                self.data.extend_from_slice(&v.to_le_bytes());
            }
            Value::Int(v) => {
                self.push_header(op, Tag::Int, offset);
                self.data.extend_from_slice(&(*v as i64).to_le_bytes());
            }
            Value::Uint(v) => {
                self.push_header(op, Tag::Uint, offset);
                self.data.extend_from_slice(&(*v as u64).to_le_bytes());
            }
            Value::Float32(v) => {
                self.push_header(op, Tag::F32, offset);
                self.data.extend_from_slice(&v.to_le_bytes());
            }
            Value::Float64(v) => {
                self.push_header(op, Tag::F64, offset);
                self.data.extend_from_slice(&v.to_le_bytes());
            }
            Value::String(v) => {
                self.push_header(op, Tag::Str, offset);
                self.push_len(v.len());
                self.data.extend_from_slice(v.as_bytes());
            }
            Value::Bytes(v) => {
                self.push_header(op, Tag::Bytes, offset);
                self.push_len(v.len());
                self.data.extend_from_slice(v);
            }
        }
    }

    /// Invokes `visit` once per distinct chunk with entries, ascending.
    pub fn range_chunks(&self, mut visit: impl FnMut(Chunk)) {
        let mut seen: SmallVec<[Chunk; 8]> = SmallVec::new();
        for span in &self.spans {
            if !seen.contains(&span.chunk) {
                seen.push(span.chunk);
            }
        }
        seen.sort_unstable();
        for chunk in seen {
            visit(chunk);
        }
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut [u8], &[Span]) {
        let Self { data, spans, .. } = self;
        (data.as_mut_slice(), spans.as_slice())
    }

    /// Writes the type byte and the offset for one entry, opening a new
    /// span when the chunk changes or the offset moves backwards.
    fn push_header(&mut self, op: Op, tag: Tag, offset: u32) {
        let chunk = Chunk::of(offset);
        match self.spans.last_mut() {
            Some(span) if span.chunk == chunk && offset >= span.last => {
                let delta = offset - span.last;
                span.last = offset;
                self.data.push(pack_type(false, op, tag));
                let mut buf = [0u8; MAX_VARINT_LEN];
                let n = encode_varint(u64::from(delta), &mut buf);
                self.data.extend_from_slice(&buf[..n]);
            }
            _ => {
                self.spans.push(Span {
                    chunk,
                    start: self.data.len(),
                    last: offset,
                });
                self.data.push(pack_type(true, op, tag));
                self.data.extend_from_slice(&offset.to_le_bytes());
            }
        }
    }

    fn push_len(&mut self, len: usize) {
        let mut buf = [0u8; MAX_VARINT_LEN];
        let n = encode_varint(len as u64, &mut buf);
        self.data.extend_from_slice(&buf[..n]);
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_empty() {
        let buf = Buffer::new();

        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.name(), "");
    }

    #[test]
    fn reset_records_name_and_clears_entries() {
        let mut buf = Buffer::new();
        buf.put_u32(1, 42);

        buf.reset("balance");

        assert!(buf.is_empty());
        assert_eq!(buf.name(), "balance");
    }

    #[test]
    fn sequential_u64_entries_use_one_byte_deltas() {
        let mut buf = Buffer::new();
        buf.reset("test");
        for i in 0u32..10 {
            buf.put_u64(i, 2 * u64::from(i));
        }

        // First entry: type + 4-byte absolute + 8-byte payload = 13.
        // Each later entry: type + 1-byte delta + 8-byte payload = 10.
        assert_eq!(buf.len(), 13 + 9 * 10);
        assert_eq!(buf.spans.len(), 1);
    }

    #[test]
    fn bool_entries_have_no_payload() {
        let mut buf = Buffer::new();
        buf.put_bool(0, true);
        buf.put_bool(1, false);

        // type + absolute, then type + delta.
        assert_eq!(buf.len(), 5 + 2);
    }

    #[test]
    fn string_entries_are_length_prefixed() {
        let mut buf = Buffer::new();
        buf.put_str(0, "hello");

        // type + absolute + 1-byte length + 5 bytes.
        assert_eq!(buf.len(), 1 + 4 + 1 + 5);
    }

    #[test]
    fn chunk_change_opens_new_span() {
        let mut buf = Buffer::new();
        buf.put_u32(0, 1);
        buf.put_u32(16383, 2);
        buf.put_u32(16384, 3);

        assert_eq!(buf.spans.len(), 2);
        assert_eq!(buf.spans[0].chunk, Chunk(0));
        assert_eq!(buf.spans[1].chunk, Chunk(1));
    }

    #[test]
    fn backwards_offset_opens_new_span() {
        let mut buf = Buffer::new();
        buf.put_u32(5, 1);
        buf.put_u32(3, 2);

        assert_eq!(buf.spans.len(), 2);
        assert_eq!(buf.spans[0].chunk, buf.spans[1].chunk);
    }

    #[test]
    fn range_chunks_visits_distinct_chunks_ascending() {
        let mut buf = Buffer::new();
        buf.put_u32(Chunk(5).min_offset(), 1);
        buf.put_u32(Chunk(0).min_offset(), 2);
        buf.put_u32(Chunk(5).min_offset() + 1, 3);
        buf.put_u32(Chunk(2).min_offset(), 4);

        let mut visited = Vec::new();
        buf.range_chunks(|chunk| visited.push(chunk));

        assert_eq!(visited, vec![Chunk(0), Chunk(2), Chunk(5)]);
    }

    #[test]
    fn put_any_covers_every_variant() {
        let mut buf = Buffer::new();
        let values = [
            Value::Bool(true),
            Value::Int16(1),
            Value::Int32(2),
            Value::Int64(3),
            Value::Uint16(4),
            Value::Uint32(5),
            Value::Uint64(6),
            Value::Int(7),
            Value::Uint(8),
            Value::Float32(9.0),
            Value::Float64(10.0),
            Value::String("eleven".into()),
            Value::Bytes(vec![12]),
        ];

        for (i, value) in values.iter().enumerate() {
            buf.put_any(Op::Put, i as u32, value);
        }

        assert!(!buf.is_empty());
        assert_eq!(buf.spans.len(), 1);
    }
}
