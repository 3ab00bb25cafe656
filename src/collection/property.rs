//! # Property Column
//!
//! A single typed column: row handle -> value for the rows where the field
//! is present. Presence is a `RoaringBitmap` so queries can intersect it
//! with the live-row set in O(1) per block; values live in a dense vector
//! indexed by handle.
//!
//! A property is monomorphic in the semantic sense (one field, one logical
//! type across the rows it holds), but the interface accepts the dynamic
//! `Value` of the enclosing object; typed extraction is the caller's
//! concern until the commit reader's typed accessors are used.

use roaring::RoaringBitmap;

use crate::types::Value;

/// One typed column of the collection.
#[derive(Debug, Default)]
pub struct Property {
    fill: RoaringBitmap,
    data: Vec<Option<Value>>,
}

impl Property {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a value and marks the handle present, overwriting any prior
    /// value.
    pub fn set(&mut self, handle: u32, value: Value) {
        let slot = handle as usize;
        if slot >= self.data.len() {
            self.data.resize(slot + 1, None);
        }
        self.data[slot] = Some(value);
        self.fill.insert(handle);
    }

    /// Current value for the handle, or `None` if the field is absent.
    pub fn get(&self, handle: u32) -> Option<&Value> {
        if !self.fill.contains(handle) {
            return None;
        }
        self.data.get(handle as usize).and_then(|slot| slot.as_ref())
    }

    /// Clears presence for the handle. The slot is released but the vector
    /// never shrinks; a no-op for absent handles.
    pub fn remove(&mut self, handle: u32) {
        if self.fill.remove(handle) {
            if let Some(slot) = self.data.get_mut(handle as usize) {
                *slot = None;
            }
        }
    }

    pub fn contains(&self, handle: u32) -> bool {
        self.fill.contains(handle)
    }

    /// Number of handles with this field present.
    pub fn len(&self) -> u64 {
        self.fill.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fill.is_empty()
    }

    pub(crate) fn fill(&self) -> &RoaringBitmap {
        &self.fill
    }
}
