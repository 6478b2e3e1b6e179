//! Deferred scheduler (microtask queue).
//!
//! [`defer`] queues a unit of work to run after the current synchronous call
//! stack has unwound. Units run in FIFO order when the host calls
//! [`run_microtasks`], which keeps draining until the queue is empty, so
//! units queued by other units still run in the same drain. The lab event
//! loop drains after every macrotask, which gives the usual ordering: all
//! microtasks before the next timer.
//!
//! The queue is thread-local. Each thread is an independent single-threaded
//! "process"; nothing here is `Send`.
//!
//! Nothing in the future machinery drains the queue on its own. That is what
//! keeps reaction delivery asynchronous: a reaction is never invoked inside
//! the call that registered it.

use super::queue::CallbackQueue;
use crate::tracing_compat::trace;
use std::cell::RefCell;

/// A deferred unit of work.
pub type Microtask = Box<dyn FnOnce()>;

/// Counters for the current thread's queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MicrotaskStats {
    /// Units passed to [`defer`].
    pub enqueued: u64,
    /// Units that ran to completion.
    pub executed: u64,
    /// Drains started (re-entrant calls excluded).
    pub drains: u64,
}

/// Result of a single drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Units executed by this drain.
    pub executed: u64,
    /// Units still queued when the drain returned.
    pub remaining: usize,
}

impl DrainReport {
    /// Returns true if the drain stopped before the queue was empty.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining > 0
    }
}

struct MicrotaskQueue {
    tasks: CallbackQueue<Microtask>,
    draining: bool,
    stats: MicrotaskStats,
}

thread_local! {
    static MICROTASKS: RefCell<MicrotaskQueue> = const {
        RefCell::new(MicrotaskQueue {
            tasks: CallbackQueue::new(),
            draining: false,
            stats: MicrotaskStats {
                enqueued: 0,
                executed: 0,
                drains: 0,
            },
        })
    };
}

/// Clears the draining flag even if a unit panics.
struct DrainGuard;

impl Drop for DrainGuard {
    fn drop(&mut self) {
        let _ = MICROTASKS.try_with(|q| q.borrow_mut().draining = false);
    }
}

/// Queues `task` to run on the next drain of this thread's queue.
pub fn defer<F>(task: F)
where
    F: FnOnce() + 'static,
{
    MICROTASKS.with(|q| {
        let mut q = q.borrow_mut();
        q.tasks.push(Box::new(task));
        q.stats.enqueued += 1;
    });
}

/// Runs queued units until the queue is empty, including units queued while
/// draining. Returns the number of units executed.
///
/// Calling this from inside a running unit is a no-op returning 0; the outer
/// drain picks up whatever was queued.
pub fn run_microtasks() -> u64 {
    drain(None).executed
}

/// Like [`run_microtasks`], but stops after `limit` units.
///
/// Used by hosts that want to guard against reaction chains that never stop
/// queuing work.
pub fn run_microtasks_with_limit(limit: u64) -> DrainReport {
    drain(Some(limit))
}

/// Returns the number of queued units.
#[must_use]
pub fn pending_microtasks() -> usize {
    MICROTASKS.with(|q| q.borrow().tasks.len())
}

/// Returns true while a drain is running on this thread.
#[must_use]
pub fn is_draining() -> bool {
    MICROTASKS.with(|q| q.borrow().draining)
}

/// Drops every queued unit without running it. Returns how many were dropped.
pub fn clear_microtasks() -> usize {
    let dropped = MICROTASKS.with(|q| q.borrow_mut().tasks.take());
    dropped.len()
}

/// Returns this thread's counters.
#[must_use]
pub fn stats() -> MicrotaskStats {
    MICROTASKS.with(|q| q.borrow().stats)
}

/// Resets this thread's counters.
pub fn reset_stats() {
    MICROTASKS.with(|q| q.borrow_mut().stats = MicrotaskStats::default());
}

fn drain(limit: Option<u64>) -> DrainReport {
    let entered = MICROTASKS.with(|q| {
        let mut q = q.borrow_mut();
        if q.draining {
            return false;
        }
        q.draining = true;
        q.stats.drains += 1;
        true
    });
    if !entered {
        return DrainReport {
            executed: 0,
            remaining: pending_microtasks(),
        };
    }
    let _guard = DrainGuard;

    let mut executed = 0u64;
    loop {
        if limit.is_some_and(|limit| executed >= limit) {
            break;
        }
        // The borrow must end before the unit runs: units call `defer`.
        let next = MICROTASKS.with(|q| q.borrow_mut().tasks.pop());
        let Some(task) = next else {
            break;
        };
        task();
        executed += 1;
        MICROTASKS.with(|q| q.borrow_mut().stats.executed += 1);
    }

    let remaining = pending_microtasks();
    trace!(executed, remaining, "microtask drain finished");
    DrainReport {
        executed,
        remaining,
    }
}
