//! # Scratch Bitmap Pool
//!
//! Pool of reusable `RoaringBitmap`s backing query row sets.
//!
//! ## Purpose
//!
//! Every query materializes the live-row set into a bitmap sized
//! proportionally to the collection. Under query-heavy workloads that is a
//! per-query allocation on the hot path; the pool amortizes it by recycling
//! bitmaps (and their container storage) across queries.
//!
//! ## Usage
//!
//! ```ignore
//! let pool = BitmapPool::new(4); // Pre-allocate 4 bitmaps
//!
//! // Acquire a bitmap (from the pool, or newly allocated if empty)
//! let mut rows = pool.acquire();
//! rows.insert_range(0..1000);
//!
//! // Bitmap is cleared and returned to the pool when dropped
//! drop(rows);
//! ```
//!
//! ## Design
//!
//! `PooledBitmap` uses `ManuallyDrop` instead of `Option` to make invalid
//! states unrepresentable at the type level. Acquisition always yields an
//! empty bitmap: handles are cleared on the way back into the pool.

use parking_lot::Mutex;
use roaring::RoaringBitmap;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// A pool of reusable row-set bitmaps.
///
/// Bitmaps are returned to the pool when the handle is dropped, so the
/// query path allocates only when the pool runs dry.
#[derive(Clone)]
pub struct BitmapPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    free: Mutex<Vec<RoaringBitmap>>,
}

impl BitmapPool {
    /// Create a new pool with the specified number of pre-allocated bitmaps.
    pub fn new(initial_capacity: usize) -> Self {
        let mut free = Vec::with_capacity(initial_capacity);
        free.resize_with(initial_capacity, RoaringBitmap::new);
        Self {
            inner: Arc::new(PoolInner {
                free: Mutex::new(free),
            }),
        }
    }

    /// Acquire an empty bitmap from the pool, allocating if the pool is dry.
    /// The bitmap returns to the pool when dropped.
    pub fn acquire(&self) -> PooledBitmap {
        let bitmap = self.inner.free.lock().pop().unwrap_or_default();
        PooledBitmap {
            bitmap: ManuallyDrop::new(bitmap),
            pool: Arc::clone(&self.inner),
        }
    }

    /// Current number of idle bitmaps in the pool.
    pub fn available(&self) -> usize {
        self.inner.free.lock().len()
    }
}

/// A scratch bitmap that returns to its pool when dropped.
///
/// Provides `Deref` and `DerefMut` to the underlying `RoaringBitmap`.
pub struct PooledBitmap {
    /// Always valid until Drop takes it back out.
    bitmap: ManuallyDrop<RoaringBitmap>,
    pool: Arc<PoolInner>,
}

impl std::fmt::Debug for PooledBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBitmap")
            .field("cardinality", &self.bitmap.len())
            .finish()
    }
}

impl Deref for PooledBitmap {
    type Target = RoaringBitmap;

    fn deref(&self) -> &Self::Target {
        &self.bitmap
    }
}

impl DerefMut for PooledBitmap {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.bitmap
    }
}

impl Drop for PooledBitmap {
    fn drop(&mut self) {
        // SAFETY: taken exactly once, here; the bitmap is valid until Drop.
        let mut bitmap = unsafe { ManuallyDrop::take(&mut self.bitmap) };
        bitmap.clear();
        self.pool.free.lock().push(bitmap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_and_return() {
        let pool = BitmapPool::new(2);
        assert_eq!(pool.available(), 2);

        let b1 = pool.acquire();
        assert_eq!(pool.available(), 1);

        let b2 = pool.acquire();
        assert_eq!(pool.available(), 0);

        // Pool dry, this one allocates
        let _b3 = pool.acquire();
        assert_eq!(pool.available(), 0);

        drop(b1);
        assert_eq!(pool.available(), 1);

        drop(b2);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn returned_bitmaps_come_back_empty() {
        let pool = BitmapPool::new(1);

        let mut rows = pool.acquire();
        rows.insert_range(0..100);
        assert_eq!(rows.len(), 100);
        drop(rows);

        let rows = pool.acquire();
        assert!(rows.is_empty());
    }

    #[test]
    fn clones_share_the_pool() {
        let pool1 = BitmapPool::new(2);
        let pool2 = pool1.clone();

        let _b = pool1.acquire();
        assert_eq!(pool2.available(), 1);
    }
}
