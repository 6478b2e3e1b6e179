//! Settle: deferred values with microtask scheduling for Rust.
//!
//! # Overview
//!
//! A [`Future`] is a placeholder for a value produced later. It starts
//! `Pending` and settles exactly once, to `Fulfilled` with a value or to
//! `Rejected` with a reason. Reactions registered on it run in registration
//! order, always on the microtask queue and never inside the call that
//! registered them.
//!
//! # Core Guarantees
//!
//! - **Single settlement**: the first `complete`/`fail` wins; later calls are silent no-ops
//! - **Ordered delivery**: reactions of one kind run in registration order
//! - **Asynchronous delivery**: no public operation runs a reaction synchronously
//! - **Faults become rejections**: errors and panics in initializers or reactions reject the child
//! - **Flattening**: a reaction returning a future makes its child adopt that future's outcome
//!
//! # Module Structure
//!
//! - [`types`]: Core types (values, outcomes, identifiers, virtual time)
//! - [`future`]: The future state machine, capabilities and the thenable contract
//! - [`combinator`]: `all_of`, `all_settled`, `race_of`, `any_of`
//! - [`runtime`]: The microtask queue and the callback queue behind it
//! - [`lab`]: Deterministic event loop with virtual-time timers
//! - [`error`](mod@error): Error types
//! - [`tracing_compat`]: Optional tracing integration (requires `tracing-integration` feature)
//!
//! # Example
//!
//! ```
//! use settle::{Future, Value, runtime::run_microtasks};
//!
//! let total = Future::all_of([Future::resolve_with(1), Future::resolve_with(2)])
//!     .then(|values| {
//!         values
//!             .as_list()
//!             .map_or(0, |items| items.iter().filter_map(Value::as_int).sum::<i64>())
//!     });
//!
//! run_microtasks();
//! assert_eq!(total.value(), Some(Value::Int(3)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_inception)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

pub mod combinator;
pub mod error;
pub mod future;
pub mod lab;
pub mod runtime;
pub mod tracing_compat;
pub mod types;

#[cfg(any(test, feature = "test-internals"))]
pub mod test_utils;

pub use error::{AggregateError, LabError, LabResult};
pub use future::{Complete, Fail, Future, Thenable};
pub use lab::{LabConfig, LabRuntime};
pub use types::{FutureId, Outcome, State, Time, TimerId, Value};
