//! # Variable-Length Integer Encoding
//!
//! This module provides variable-length integer encoding for the commit log,
//! used for offset deltas within a chunk and for string/bytes length
//! prefixes. This is NOT used for type codes (which use a fixed one-byte
//! prefix).
//!
//! ## Encoding Format
//!
//! Classic 7-bit continuation encoding, least significant group first. Each
//! byte carries 7 value bits; the high bit is set on every byte except the
//! last:
//!
//! | Value Range              | Bytes |
//! |--------------------------|-------|
//! | 0 - 127                  | 1     |
//! | 128 - 16383              | 2     |
//! | 16384 - 2097151          | 3     |
//! | 2097152 - 268435455      | 4     |
//! | ...                      | ...   |
//! | up to u64::MAX           | 10    |
//!
//! ## Design Rationale
//!
//! Offset deltas within a 16k-row chunk never exceed 16383, so a delta is
//! 1-2 bytes in the common case and at most 3 bytes. Length prefixes for
//! realistic strings fit in 1-2 bytes. The stream is append-only, and this
//! encoding writes least-significant-first so values are emitted in a single
//! forward pass with no length pre-computation.
//!
//! ## Zero-Copy Design
//!
//! All functions operate on byte slices directly:
//! - `encode_varint` writes to a mutable slice, returns bytes written
//! - `decode_varint` reads from a slice, returns (value, bytes_read)
//! - `varint_len` computes length without any I/O
//!
//! No heap allocations are performed by any function in this module.
//!
//! ## Error Handling
//!
//! `decode_varint` returns `eyre::Result` with descriptive error messages:
//! - Empty buffer: "empty buffer for varint decode"
//! - Truncated encoding: "truncated varint after N bytes"
//! - Over-long encoding: "varint exceeds 10 bytes"
//! - Overflow: "varint overflows 64 bits"

use eyre::{bail, ensure, Result};

/// Maximum encoded length of a u64.
pub const MAX_VARINT_LEN: usize = 10;

pub fn varint_len(value: u64) -> usize {
    if value == 0 {
        return 1;
    }
    let bits = 64 - value.leading_zeros() as usize;
    (bits + 6) / 7
}

pub fn encode_varint(mut value: u64, buf: &mut [u8]) -> usize {
    let mut i = 0;
    while value >= 0x80 {
        buf[i] = (value as u8) | 0x80;
        value >>= 7;
        i += 1;
    }
    buf[i] = value as u8;
    i + 1
}

pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize)> {
    ensure!(!buf.is_empty(), "empty buffer for varint decode");

    let mut value = 0u64;
    for i in 0..MAX_VARINT_LEN {
        let Some(&byte) = buf.get(i) else {
            bail!("truncated varint after {} bytes", i);
        };
        let part = u64::from(byte & 0x7F);
        let shift = (7 * i) as u32;
        if shift == 63 {
            // Final group of a full-width value holds a single bit.
            ensure!(part <= 1, "varint overflows 64 bits");
        }
        value |= part << shift;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    bail!("varint exceeds {} bytes", MAX_VARINT_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_len_single_byte_values() {
        assert_eq!(varint_len(0), 1);
        assert_eq!(varint_len(1), 1);
        assert_eq!(varint_len(127), 1);
    }

    #[test]
    fn varint_len_two_byte_values() {
        assert_eq!(varint_len(128), 2);
        assert_eq!(varint_len(1000), 2);
        assert_eq!(varint_len(16383), 2);
    }

    #[test]
    fn varint_len_three_byte_values() {
        assert_eq!(varint_len(16384), 3);
        assert_eq!(varint_len(2_097_151), 3);
    }

    #[test]
    fn varint_len_max_values() {
        assert_eq!(varint_len(2_097_152), 4);
        assert_eq!(varint_len(u64::from(u32::MAX)), 5);
        assert_eq!(varint_len(u64::MAX), 10);
    }

    #[test]
    fn encode_varint_single_byte() {
        let mut buf = [0u8; MAX_VARINT_LEN];

        assert_eq!(encode_varint(0, &mut buf), 1);
        assert_eq!(buf[0], 0);

        assert_eq!(encode_varint(127, &mut buf), 1);
        assert_eq!(buf[0], 127);
    }

    #[test]
    fn encode_varint_two_byte() {
        let mut buf = [0u8; MAX_VARINT_LEN];

        assert_eq!(encode_varint(128, &mut buf), 2);
        assert_eq!(buf[0], 0x80);
        assert_eq!(buf[1], 0x01);

        assert_eq!(encode_varint(16383, &mut buf), 2);
        assert_eq!(buf[0], 0xFF);
        assert_eq!(buf[1], 0x7F);
    }

    #[test]
    fn encode_varint_nine_plus_byte() {
        let mut buf = [0u8; MAX_VARINT_LEN];

        assert_eq!(encode_varint(u64::MAX, &mut buf), 10);
        assert_eq!(buf[9], 0x01);
    }

    #[test]
    fn decode_varint_single_byte() {
        let (value, len) = decode_varint(&[0u8]).unwrap();
        assert_eq!(value, 0);
        assert_eq!(len, 1);

        let (value, len) = decode_varint(&[127u8]).unwrap();
        assert_eq!(value, 127);
        assert_eq!(len, 1);
    }

    #[test]
    fn decode_varint_two_byte() {
        let (value, len) = decode_varint(&[0x80, 0x01]).unwrap();
        assert_eq!(value, 128);
        assert_eq!(len, 2);

        let (value, len) = decode_varint(&[0xFF, 0x7F]).unwrap();
        assert_eq!(value, 16383);
        assert_eq!(len, 2);
    }

    #[test]
    fn decode_varint_ignores_trailing_bytes() {
        let (value, len) = decode_varint(&[0x05, 0xAB, 0xCD]).unwrap();
        assert_eq!(value, 5);
        assert_eq!(len, 1);
    }

    #[test]
    fn decode_varint_empty_buffer_fails() {
        assert!(decode_varint(&[]).is_err());
    }

    #[test]
    fn decode_varint_truncated_fails() {
        assert!(decode_varint(&[0x80]).is_err());
        assert!(decode_varint(&[0xFF, 0xFF]).is_err());
    }

    #[test]
    fn decode_varint_overlong_fails() {
        let buf = [0xFFu8; 11];
        assert!(decode_varint(&buf).is_err());
    }

    #[test]
    fn decode_varint_overflow_fails() {
        // 10 groups with value bits above the 64th bit set.
        let buf = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F];
        assert!(decode_varint(&buf).is_err());
    }

    #[test]
    fn roundtrip_boundary_values() {
        let boundary_values = [
            0u64,
            1,
            127,
            128,
            16383,
            16384,
            2_097_151,
            2_097_152,
            268_435_455,
            268_435_456,
            u64::from(u32::MAX),
            u64::MAX,
        ];

        for &value in &boundary_values {
            let mut buf = [0u8; MAX_VARINT_LEN];
            let encoded_len = encode_varint(value, &mut buf);
            let (decoded, decoded_len) = decode_varint(&buf).unwrap();

            assert_eq!(
                encoded_len, decoded_len,
                "length mismatch for value {}",
                value
            );
            assert_eq!(value, decoded, "value mismatch for value {}", value);
            assert_eq!(
                varint_len(value),
                encoded_len,
                "varint_len mismatch for value {}",
                value
            );
        }
    }
}
