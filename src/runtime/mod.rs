//! Scheduling primitives.
//!
//! - [`queue`]: the FIFO [`CallbackQueue`] used for reactions and microtasks
//! - [`microtask`]: the thread-local deferred scheduler

pub mod microtask;
pub mod queue;

pub use microtask::{
    DrainReport, Microtask, MicrotaskStats, defer, pending_microtasks, run_microtasks,
    run_microtasks_with_limit,
};
pub use queue::CallbackQueue;
