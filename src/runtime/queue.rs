//! FIFO callback queue.
//!
//! Holds pending reaction closures (and microtasks) in enqueue order. The
//! queue has no synchronization of its own; every owner touches it from a
//! single thread.

use std::collections::VecDeque;
use std::fmt;

/// An unbounded first-in first-out queue.
pub struct CallbackQueue<T> {
    inner: VecDeque<T>,
}

impl<T> CallbackQueue<T> {
    /// Creates a new empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: VecDeque::new(),
        }
    }

    /// Appends an entry at the back.
    pub fn push(&mut self, entry: T) {
        self.inner.push_back(entry);
    }

    /// Returns the entry at the front without removing it.
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.inner.front()
    }

    /// Removes and returns the entry at the front.
    pub fn pop(&mut self) -> Option<T> {
        self.inner.pop_front()
    }

    /// Returns the number of queued entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Removes every entry, returning them in order.
    pub fn take(&mut self) -> Self {
        Self {
            inner: std::mem::take(&mut self.inner),
        }
    }
}

impl<T> Default for CallbackQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CallbackQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackQueue")
            .field("len", &self.inner.len())
            .finish_non_exhaustive()
    }
}
