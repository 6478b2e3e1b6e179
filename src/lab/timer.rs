//! Timer heap for virtual deadlines.
//!
//! A min-heap of `(deadline, timer)` pairs. Timers sharing a deadline pop in
//! the order they were inserted.

use crate::types::{Time, TimerId};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Eq, PartialEq)]
struct TimerEntry {
    deadline: Time,
    timer: TimerId,
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (earliest deadline first).
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.timer.generation.cmp(&self.timer.generation))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A min-heap of timers ordered by deadline, then by insertion order.
#[derive(Debug, Default)]
pub struct TimerHeap {
    heap: BinaryHeap<TimerEntry>,
}

impl TimerHeap {
    /// Creates a new empty timer heap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries, cancelled ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true if the heap is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Adds a timer. Its generation orders it among equal deadlines.
    pub fn insert(&mut self, timer: TimerId, deadline: Time) {
        self.heap.push(TimerEntry { deadline, timer });
    }

    /// Returns the earliest entry without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<(TimerId, Time)> {
        self.heap.peek().map(|e| (e.timer, e.deadline))
    }

    /// Returns the earliest deadline, if any.
    #[must_use]
    pub fn peek_deadline(&self) -> Option<Time> {
        self.heap.peek().map(|e| e.deadline)
    }

    /// Removes and returns the earliest entry.
    pub fn pop(&mut self) -> Option<(TimerId, Time)> {
        self.heap.pop().map(|e| (e.timer, e.deadline))
    }

    /// Clears all timers.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
