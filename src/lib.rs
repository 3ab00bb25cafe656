//! # gridstore - In-Memory Columnar Object Store
//!
//! gridstore is a row-addressable collection of heterogeneous records whose
//! fields are physically grouped by name into independent typed columns,
//! paired with a compact delta-encoded commit log that records mutations to
//! those columns. This implementation prioritizes:
//!
//! - **Stable handles**: rows keep their 32-bit id for life; freed ids are
//!   recycled smallest-first so the dense region stays dense
//! - **Bitmap query composition**: predicate filters narrow compressed
//!   bitmap row sets, with pooled scratch bitmaps on the query path
//! - **Compact commit logs**: per-16k-chunk delta-encoded offsets with
//!   variable-width payloads and in-place value rewriting
//!
//! ## Quick Start
//!
//! ```ignore
//! use gridstore::{object, Collection};
//!
//! let coll = Collection::new();
//! let alice = coll.add(object! { "name" => "Alice", "age" => 30i64 });
//!
//! let adults = coll.filter("age", |v| v.as_i64().is_some_and(|age| age >= 18));
//! assert!(adults.contains(alice));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │      Public API (Collection)         │
//! ├───────────────────┬─────────────────┤
//! │  Property Columns │  Query Row Sets  │
//! ├───────────────────┴─────────────────┤
//! │   Commit Log (Buffer / Reader)       │
//! ├─────────────────────────────────────┤
//! │  Varint + Type-Byte Wire Encoding    │
//! └─────────────────────────────────────┘
//! ```
//!
//! Writers either mutate property columns directly through
//! `Collection::add`/`remove`, or accumulate typed entries in a commit
//! [`Buffer`] that `Collection::apply` later replays into a column. Readers
//! call `Collection::fetch` for one row or compose [`Query`] filters for
//! bitmap row sets.
//!
//! ## Concurrency
//!
//! A collection supports many concurrent readers or one exclusive writer
//! via a reader/writer lock; all operations are CPU-bound and run to
//! completion under their lock. Commit buffers and readers are
//! single-threaded by construction and synchronized by their owner.
//!
//! ## Module Overview
//!
//! - [`collection`]: property columns, the collection, predicate queries
//! - [`commit`]: delta-encoded commit buffer and cursor
//! - [`encoding`]: varint primitives for the wire format
//! - [`memory`]: pooled scratch bitmaps
//! - [`types`]: boundary `Value`/`Object` shapes
//! - [`config`]: centralized constants

#[macro_use]
mod macros;

pub mod collection;
pub mod commit;
pub mod config;
pub mod encoding;
pub mod memory;
pub mod types;

pub use collection::{Collection, Property, Query};
pub use commit::{Buffer, Chunk, Op, Reader};
pub use types::{Object, Value};
