//! # Columnar Collection
//!
//! A row-addressable store of heterogeneous records whose fields are
//! physically grouped by name into independent [`Property`] columns. Rows
//! are addressed by stable integer handles recycled through a free list,
//! and queries are predicate filters producing bitmap row sets.
//!
//! ## Handles
//!
//! Handles are allocated densely from 0 upward. `remove` returns a handle
//! to the free list (a compressed bitmap), and `add` prefers the smallest
//! free handle before growing, so the dense region stays dense and bitmap
//! operations stay compact. A handle is live iff it is below the high-water
//! mark and not free; `count` is the high-water mark minus the free
//! cardinality.
//!
//! ## Concurrency
//!
//! One reader/writer lock guards the whole structure: `count`, `fetch`,
//! `fetch_to`, and query construction take the read lock; `add`, `remove`,
//! and `apply` take the write lock. Property columns and commit buffers are
//! not internally synchronized; the collection's lock (or the caller, for
//! free-standing buffers) provides that.
//!
//! ## Commit Mode
//!
//! Mutations can bypass direct property writes: a writer accumulates typed
//! put/delete entries in a [`Buffer`](crate::commit::Buffer) labeled with a
//! property name, and [`Collection::apply`] later replays the log into that
//! column under a single write-lock acquisition.

mod property;
mod query;

pub use property::Property;
pub use query::Query;

use eyre::{ensure, Result};
use hashbrown::HashMap;
use parking_lot::RwLock;
use roaring::RoaringBitmap;

use crate::commit::{Buffer, Op, Reader};
use crate::config::{DEFAULT_POOL_CAPACITY, DEFAULT_PROPS_CAPACITY};
use crate::memory::BitmapPool;
use crate::types::{Object, Value};

pub(crate) struct State {
    /// High-water mark of ever-allocated handles.
    pub(crate) size: u32,
    /// Currently-unallocated handles strictly below `size`.
    pub(crate) free: RoaringBitmap,
    pub(crate) props: HashMap<String, Property>,
}

/// Columnar collection of objects with stable row handles.
pub struct Collection {
    pub(crate) state: RwLock<State>,
    scratch: BitmapPool,
}

impl Collection {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                size: 0,
                free: RoaringBitmap::new(),
                props: HashMap::with_capacity(DEFAULT_PROPS_CAPACITY),
            }),
            scratch: BitmapPool::new(DEFAULT_POOL_CAPACITY),
        }
    }

    /// Number of live rows.
    pub fn count(&self) -> usize {
        let state = self.state.read();
        (u64::from(state.size) - state.free.len()) as usize
    }

    /// Adds an object, allocating the smallest free handle (or growing the
    /// high-water mark), and sets every field on its property column.
    /// Columns are created lazily on first use of a field name.
    pub fn add(&self, object: Object) -> u32 {
        let mut state = self.state.write();

        let handle = match state.free.min() {
            Some(free) => {
                state.free.remove(free);
                free
            }
            None => {
                let next = state.size;
                state.size += 1;
                next
            }
        };

        for (name, value) in object {
            state
                .props
                .entry(name)
                .or_insert_with(Property::new)
                .set(handle, value);
        }

        handle
    }

    /// Removes a live row, returning its handle to the free list and
    /// clearing every property. A no-op for handles that are not live.
    pub fn remove(&self, handle: u32) {
        let mut state = self.state.write();
        if handle >= state.size || !state.free.insert(handle) {
            return;
        }
        for prop in state.props.values_mut() {
            prop.remove(handle);
        }
    }

    /// Assembles the object stored at the handle, or `None` if the handle
    /// is not live.
    pub fn fetch(&self, handle: u32) -> Option<Object> {
        let mut object = Object::with_capacity(DEFAULT_PROPS_CAPACITY);
        if self.fetch_to(handle, &mut object) {
            Some(object)
        } else {
            None
        }
    }

    /// Assembles the object stored at the handle into a caller-provided
    /// object. Returns false without touching `dest` if the handle is not
    /// live.
    ///
    /// This is an accumulate-into contract: fields present on the row are
    /// written over `dest`'s keys, and keys of `dest` that no present field
    /// overwrites are left untouched.
    pub fn fetch_to(&self, handle: u32, dest: &mut Object) -> bool {
        let state = self.state.read();
        if handle >= state.size || state.free.contains(handle) {
            return false;
        }
        for (name, prop) in state.props.iter() {
            if let Some(value) = prop.get(handle) {
                dest.insert(name.clone(), value.clone());
            }
        }
        true
    }

    /// Starts a query over the live-row set. The read lock is held only
    /// while the row set is materialized; the scratch bitmap behind the
    /// query returns to the collection's pool when the query is dropped.
    pub fn query(&self) -> Query<'_> {
        let mut rows = self.scratch.acquire();
        let state = self.state.read();
        if state.size > 0 {
            rows.insert_range(0..state.size);
            *rows -= &state.free;
        }
        drop(state);
        Query { owner: self, rows }
    }

    /// Shorthand for `query().filter(name, predicate)`.
    pub fn filter<P>(&self, name: &str, predicate: P) -> Query<'_>
    where
        P: Fn(&Value) -> bool,
    {
        self.query().filter(name, predicate)
    }

    /// Replays a commit buffer into the property column named by the
    /// buffer's label, under one write-lock acquisition: put entries set
    /// the decoded value, delete entries clear presence.
    pub fn apply(&self, buffer: &mut Buffer) -> Result<()> {
        let name = buffer.name().to_string();
        ensure!(!name.is_empty(), "commit buffer has no property label");

        let mut state = self.state.write();
        let prop = state.props.entry(name).or_insert_with(Property::new);

        let mut reader = Reader::seek(buffer);
        while reader.next() {
            match reader.op() {
                Op::Put => prop.set(reader.index(), reader.value()?),
                Op::Delete => prop.remove(reader.index()),
            }
        }
        Ok(())
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object;

    #[test]
    fn add_allocates_dense_handles() {
        let coll = Collection::new();

        assert_eq!(coll.add(object! { "name" => "A" }), 0);
        assert_eq!(coll.add(object! { "name" => "B" }), 1);
        assert_eq!(coll.add(object! { "name" => "C" }), 2);
        assert_eq!(coll.count(), 3);
    }

    #[test]
    fn remove_frees_smallest_handle_first() {
        let coll = Collection::new();
        coll.add(object! { "x" => 1i64 });
        coll.add(object! { "x" => 2i64 });
        coll.add(object! { "x" => 3i64 });

        coll.remove(1);
        coll.remove(0);

        assert_eq!(coll.add(object! { "x" => 4i64 }), 0);
        assert_eq!(coll.add(object! { "x" => 5i64 }), 1);
        assert_eq!(coll.add(object! { "x" => 6i64 }), 3);
    }

    #[test]
    fn remove_is_noop_for_dead_handles() {
        let coll = Collection::new();
        coll.add(object! { "x" => 1i64 });

        coll.remove(7);
        coll.remove(0);
        coll.remove(0);

        assert_eq!(coll.count(), 0);
    }

    #[test]
    fn fetch_returns_none_for_dead_handles() {
        let coll = Collection::new();
        let handle = coll.add(object! { "name" => "A" });

        assert!(coll.fetch(99).is_none());

        coll.remove(handle);
        assert!(coll.fetch(handle).is_none());
    }

    #[test]
    fn fetch_reassembles_all_present_fields() {
        let coll = Collection::new();
        let handle = coll.add(object! { "name" => "A", "age" => 30i64 });
        coll.add(object! { "name" => "B", "city" => "Oslo" });

        let object = coll.fetch(handle).unwrap();

        assert_eq!(object.len(), 2);
        assert_eq!(object["name"], Value::from("A"));
        assert_eq!(object["age"], Value::Int64(30));
    }

    #[test]
    fn fetch_to_accumulates_into_existing_object() {
        let coll = Collection::new();
        let handle = coll.add(object! { "name" => "A" });

        let mut dest = object! { "unrelated" => 1i64 };
        assert!(coll.fetch_to(handle, &mut dest));

        assert_eq!(dest["name"], Value::from("A"));
        assert_eq!(dest["unrelated"], Value::Int64(1));
    }

    #[test]
    fn fetch_to_leaves_dest_untouched_on_dead_handle() {
        let coll = Collection::new();

        let mut dest = object! { "keep" => true };
        assert!(!coll.fetch_to(0, &mut dest));

        assert_eq!(dest.len(), 1);
    }

    #[test]
    fn apply_replays_puts_into_named_property() {
        let coll = Collection::new();
        let h0 = coll.add(object! { "name" => "A" });
        let h1 = coll.add(object! { "name" => "B" });

        let mut buf = Buffer::new();
        buf.reset("age");
        buf.put_i64(h0, 30);
        buf.put_i64(h1, 40);
        coll.apply(&mut buf).unwrap();

        assert_eq!(coll.fetch(h0).unwrap()["age"], Value::Int64(30));
        assert_eq!(coll.fetch(h1).unwrap()["age"], Value::Int64(40));
    }

    #[test]
    fn apply_replays_deletes() {
        let coll = Collection::new();
        let handle = coll.add(object! { "name" => "A", "age" => 30i64 });

        let mut buf = Buffer::new();
        buf.reset("age");
        buf.delete(handle);
        coll.apply(&mut buf).unwrap();

        let object = coll.fetch(handle).unwrap();
        assert!(!object.contains_key("age"));
        assert_eq!(object["name"], Value::from("A"));
    }

    #[test]
    fn apply_requires_a_label() {
        let coll = Collection::new();
        let mut buf = Buffer::new();
        buf.put_i64(0, 1);

        assert!(coll.apply(&mut buf).is_err());
    }
}
