//! # Configuration Constants
//!
//! This module centralizes all configuration constants, grouping
//! interdependent values together. Constants that depend on each other are
//! co-located to prevent mismatch bugs.
//!
//! ## Dependency Graph
//!
//! ```text
//! CHUNK_SHIFT (14)
//!       │
//!       └─> CHUNK_SIZE (derived: 1 << CHUNK_SHIFT = 16384 rows)
//!             The commit log delta base granularity. This is a stable
//!             on-wire constant: buffers written with one chunk size cannot
//!             be read with another.
//!
//! DEFAULT_POOL_CAPACITY (4)
//!       │
//!       └─> Scratch bitmaps pre-allocated per collection. Queries past the
//!           pre-allocated count allocate on demand and still return to the
//!           pool.
//! ```
//!
//! ## Critical Invariants
//!
//! Enforced by compile-time assertions below:
//!
//! 1. `CHUNK_SIZE == 1 << CHUNK_SHIFT` (derived correctly)
//! 2. `CHUNK_SIZE == 16_384` (wire stability; changing this breaks every
//!    previously written commit buffer)

/// Number of low offset bits that address a row within its chunk.
///
/// `offset >> CHUNK_SHIFT` is the chunk id. Stable on-wire constant.
pub const CHUNK_SHIFT: u32 = 14;

/// Rows per chunk. Within-chunk deltas fit in 1-2 varint bytes for
/// realistic insertion patterns.
pub const CHUNK_SIZE: u32 = 1 << CHUNK_SHIFT;

/// Initial capacity of the name -> property map in a collection.
pub const DEFAULT_PROPS_CAPACITY: usize = 8;

/// Initial byte capacity of a commit buffer created without a hint.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Scratch bitmaps pre-allocated in each collection's query pool.
pub const DEFAULT_POOL_CAPACITY: usize = 4;

const _: () = assert!(CHUNK_SIZE == 1 << CHUNK_SHIFT);
const _: () = assert!(CHUNK_SIZE == 16_384);
