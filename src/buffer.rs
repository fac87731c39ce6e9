//! Fixed-capacity rolling buffer.
//!
//! Holds the most recent N items in arrival order. Pushing into a full
//! buffer evicts the oldest item, so the buffer never grows past its
//! capacity regardless of how long the stream runs. O(1) push.

use std::collections::VecDeque;

/// A bounded FIFO with oldest-eviction.
#[derive(Debug, Clone)]
pub struct RollingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingBuffer<T> {
    /// Create an empty buffer. A zero capacity is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an item, returning the evicted oldest item when full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently pushed item.
    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: Clone> RollingBuffer<T> {
    /// Copy of the `k` most recent items, oldest first.
    ///
    /// Returns fewer than `k` items if the buffer holds fewer.
    pub fn snapshot(&self, k: usize) -> Vec<T> {
        let skip = self.items.len().saturating_sub(k);
        self.items.iter().skip(skip).cloned().collect()
    }
}
