//! # Memory Module
//!
//! Pooled scratch structures:
//!
//! - [`BitmapPool`]: reusable row-set bitmaps for query construction

mod bitmap_pool;

pub use bitmap_pool::{BitmapPool, PooledBitmap};
