//! The slab-backed doubly linked recency list.
//!
//! Every cache entry lives in a `Vec<Option<Slot>>` slot indexed by position,
//! linked into a recency order via `prev`/`next` slot indices instead of raw
//! pointers. This keeps the list entirely in safe Rust, honoring this
//! crate's `#![deny(unsafe_code)]` rule — an intrusive pointer-based list
//! would otherwise be the natural choice for this job.

use std::collections::HashMap;
use std::sync::Arc;

/// One cached response.
pub(crate) struct Slot {
    pub(crate) uri: String,
    pub(crate) body: Arc<Vec<u8>>,
    pub(crate) size: usize,
    pub(crate) pin_count: u32,
    prev: Option<usize>,
    next: Option<usize>,
}

impl Slot {
    /// Builds a fresh, unlinked slot (`prev`/`next` are set on insertion).
    pub(crate) fn new(uri: String, body: Arc<Vec<u8>>, size: usize) -> Self {
        Self {
            uri,
            body,
            size,
            pin_count: 0,
            prev: None,
            next: None,
        }
    }
}

/// The store's full mutable state, guarded by the cache's single mutex.
pub(crate) struct Inner {
    pub(crate) slots: Vec<Option<Slot>>,
    free: Vec<usize>,
    pub(crate) index: HashMap<String, usize>,
    pub(crate) head: Option<usize>,
    tail: Option<usize>,
    pub(crate) total_size: usize,
}

impl Inner {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
            total_size: 0,
        }
    }

    /// Allocates a fresh, unlinked slot and returns its index.
    pub(crate) fn alloc(&mut self, slot: Slot) -> usize {
        if let Some(idx) = self.free.pop() {
            self.slots[idx] = Some(slot);
            idx
        } else {
            self.slots.push(Some(slot));
            self.slots.len() - 1
        }
    }

    /// Unlinks `idx` from the recency order without freeing its slot.
    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let slot = self.slots[idx].as_ref().expect("detach of a live index");
            (slot.prev, slot.next)
        };
        match prev {
            Some(p) => self.slots[p].as_mut().unwrap().next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].as_mut().unwrap().prev = prev,
            None => self.tail = prev,
        }
    }

    /// Appends `idx` at the tail (most-recently-used end).
    fn push_tail(&mut self, idx: usize) {
        let old_tail = self.tail;
        {
            let slot = self.slots[idx].as_mut().expect("push of a live index");
            slot.prev = old_tail;
            slot.next = None;
        }
        match old_tail {
            Some(t) => self.slots[t].as_mut().unwrap().next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }

    /// Moves `idx` to the tail. A no-op splice if it is already there.
    pub(crate) fn promote(&mut self, idx: usize) {
        self.detach(idx);
        self.push_tail(idx);
    }

    /// Inserts a freshly allocated slot at the tail.
    pub(crate) fn insert_tail(&mut self, slot: Slot) -> usize {
        let idx = self.alloc(slot);
        self.push_tail(idx);
        idx
    }

    /// Removes and frees the current head slot, returning its contents.
    ///
    /// Panics if the store is empty; callers must check `head` first.
    pub(crate) fn detach_head(&mut self) -> Slot {
        let idx = self.head.expect("detach_head called on an empty store");
        self.detach(idx);
        let slot = self.slots[idx].take().expect("head index always live");
        self.free.push(idx);
        slot
    }
}
