//! # Predicate Queries
//!
//! A query is a bitmap-valued row set derived from a collection. It starts
//! as the live-row set and narrows through predicate filters against named
//! properties; iteration yields the surviving handles in ascending order.
//!
//! The backing bitmap is scratch storage acquired from the collection's
//! pool when the query is created and returned when the query is dropped,
//! on every exit path.
//!
//! Each `filter` pass re-acquires the collection's read lock, so a pass
//! sees a consistent state; the final row set reflects a state that existed
//! between the query's creation and its last filter.

use smallvec::SmallVec;

use super::Collection;
use crate::memory::PooledBitmap;
use crate::types::Value;

/// Bitmap-valued row set over a collection, narrowed by predicate filters.
pub struct Query<'a> {
    pub(super) owner: &'a Collection,
    pub(super) rows: PooledBitmap,
}

impl<'a> Query<'a> {
    /// Narrows the row set to handles where `name` is present and the
    /// predicate holds for its value. The predicate runs exactly once per
    /// candidate row and must be pure. Filtering on a property the
    /// collection does not have empties the row set.
    pub fn filter<P>(mut self, name: &str, predicate: P) -> Self
    where
        P: Fn(&Value) -> bool,
    {
        let state = self.owner.state.read();
        match state.props.get(name) {
            None => self.rows.clear(),
            Some(prop) => {
                *self.rows &= prop.fill();
                let mut evict: SmallVec<[u32; 16]> = SmallVec::new();
                for handle in self.rows.iter() {
                    match prop.get(handle) {
                        Some(value) if predicate(value) => {}
                        _ => evict.push(handle),
                    }
                }
                for handle in evict {
                    self.rows.remove(handle);
                }
            }
        }
        self
    }

    /// Number of rows in the current set.
    pub fn count(&self) -> u64 {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, handle: u32) -> bool {
        self.rows.contains(handle)
    }

    /// Iterates the row set in ascending handle order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a Query<'a> {
    type Item = u32;
    type IntoIter = roaring::bitmap::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
