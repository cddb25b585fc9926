// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Fixed-capacity ring buffer with overwrite-oldest semantics.
//!
//! Storage is allocated once at construction and never grows. Every
//! operation runs under a single internal lock and touches at most one
//! element, so readers never hold writers up for longer than one move.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Default number of records kept by the diagnostic log.
pub const DEFAULT_CAPACITY: usize = 30;

struct Slots<T> {
    buf: Box<[Option<T>]>,
    /// Physical index of the logically oldest element.
    head: usize,
    len: usize,
}

impl<T> Slots<T> {
    fn physical(&self, index: usize) -> usize {
        (self.head + index) % self.buf.len()
    }
}

/// Thread-safe bounded FIFO that evicts its oldest entry when full.
pub struct RingLog<T> {
    slots: Mutex<Slots<T>>,
}

impl<T> RingLog<T> {
    /// Create a log holding at most `capacity` items. A zero capacity is
    /// raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let buf = std::iter::repeat_with(|| None).take(capacity).collect();
        Self {
            slots: Mutex::new(Slots {
                buf,
                head: 0,
                len: 0,
            }),
        }
    }

    fn slots(&self) -> MutexGuard<'_, Slots<T>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an item, returning the evicted oldest item when the log was full.
    pub fn push(&self, item: T) -> Option<T> {
        let mut slots = self.slots();
        let capacity = slots.buf.len();
        if slots.len == capacity {
            let head = slots.head;
            let evicted = slots.buf[head].replace(item);
            slots.head = (head + 1) % capacity;
            evicted
        } else {
            let tail = slots.physical(slots.len);
            slots.buf[tail] = Some(item);
            slots.len += 1;
            None
        }
    }

    /// Remove and return the oldest item.
    pub fn pop(&self) -> Option<T> {
        let mut slots = self.slots();
        if slots.len == 0 {
            return None;
        }
        let head = slots.head;
        let item = slots.buf[head].take();
        slots.head = (head + 1) % slots.buf.len();
        slots.len -= 1;
        item
    }

    pub fn size(&self) -> usize {
        self.slots().len
    }

    pub fn len(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn is_full(&self) -> bool {
        let slots = self.slots();
        slots.len == slots.buf.len()
    }

    pub fn capacity(&self) -> usize {
        self.slots().buf.len()
    }

    /// Drop every stored item, keeping the allocation.
    pub fn clear(&self) {
        let mut slots = self.slots();
        for slot in slots.buf.iter_mut() {
            *slot = None;
        }
        slots.head = 0;
        slots.len = 0;
    }
}

impl<T: Clone> RingLog<T> {
    /// Item at logical `index`, where 0 is the oldest. Out of range yields `None`.
    pub fn at(&self, index: usize) -> Option<T> {
        let slots = self.slots();
        if index >= slots.len {
            return None;
        }
        slots.buf[slots.physical(index)].clone()
    }

    /// Copy of all items, oldest first.
    pub fn snapshot(&self) -> Vec<T> {
        let slots = self.slots();
        (0..slots.len)
            .filter_map(|i| slots.buf[slots.physical(i)].clone())
            .collect()
    }
}

impl<T> Default for RingLog<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
