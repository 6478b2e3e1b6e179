//! Deterministic lab runtime for driving futures.
//!
//! The lab runtime provides:
//!
//! - Virtual time (no wall-clock dependencies)
//! - Timer macrotasks that fire in deadline order, ties broken by scheduling
//!   order
//! - Microtask draining between macrotasks
//! - Step and microtask limits that turn runaway programs into errors
//!
//! # Quick Start
//!
//! ```
//! use settle::lab::{LabConfig, LabRuntime};
//! use settle::{Future, Outcome};
//! use std::time::Duration;
//!
//! let mut lab = LabRuntime::new(LabConfig::new().max_steps(1_000));
//! let timeout = lab.delay_reject(Duration::from_millis(50), "timed out");
//! let work = lab.delay(Duration::from_millis(10), 42);
//!
//! let outcome = lab.run_until_settled(&Future::race_of([work, timeout])).unwrap();
//! assert_eq!(outcome, Outcome::fulfilled(42));
//! ```

pub mod config;
pub mod runtime;
pub mod timer;

pub use config::LabConfig;
pub use runtime::{LabEvent, LabHandle, LabRunReport, LabRuntime};
pub use timer::TimerHeap;
