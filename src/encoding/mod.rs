//! # Encoding Module
//!
//! This module provides encoding utilities for the commit log:
//!
//! - **Varint encoding**: 7-bit continuation varints for offset deltas and
//!   string/bytes length prefixes

pub mod varint;

pub use varint::{decode_varint, encode_varint, varint_len, MAX_VARINT_LEN};
