//! Test utilities for settle.
//!
//! This module provides shared helpers for unit and integration tests:
//! - Consistent tracing-based logging initialization
//! - Phase/section macros for readable test output
//! - Lab runtime constructors
//! - Helpers that drive a future to settlement
//! - Outcome assertion macros
//!
//! # Example
//! ```
//! use settle::Future;
//! use settle::test_utils::{init_test_logging, settle_now};
//!
//! init_test_logging();
//! let outcome = settle_now(&Future::resolve_with(1).then(|v| v.as_int().unwrap_or(0) + 1));
//! settle::assert_fulfilled!(outcome, 2);
//! ```

use crate::future::Future;
use crate::lab::{LabConfig, LabRuntime};
use crate::runtime::run_microtasks;
use crate::types::Outcome;
use std::sync::Once;
use tracing_subscriber::fmt::format::FmtSpan;

static INIT_LOGGING: Once = Once::new();

/// Step limit used by [`test_lab`].
pub const DEFAULT_TEST_MAX_STEPS: u64 = 10_000;

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::TRACE);
}

/// Initialize test logging with a custom level.
///
/// The first call wins; later calls are no-ops.
pub fn init_test_logging_with_level(level: tracing::Level) {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}

/// Create a lab runtime with a tight step limit.
#[must_use]
pub fn test_lab() -> LabRuntime {
    LabRuntime::new(LabConfig::new().max_steps(DEFAULT_TEST_MAX_STEPS))
}

/// Create a lab runtime that records every fired timer.
#[must_use]
pub fn test_lab_with_events() -> LabRuntime {
    LabRuntime::new(
        LabConfig::new()
            .max_steps(DEFAULT_TEST_MAX_STEPS)
            .trace_events(true),
    )
}

/// Drains the microtask queue and returns the outcome of `future`.
///
/// # Panics
///
/// Panics if the future is still pending once the queue is empty.
#[must_use]
pub fn settle_now(future: &Future) -> Outcome {
    run_microtasks();
    match future.outcome() {
        Some(outcome) => outcome,
        None => panic!("{future} still pending after draining microtasks"),
    }
}

/// Log a test phase transition with a visual separator.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "========================================");
        tracing::info!(phase = %$name, "TEST PHASE: {}", $name);
        tracing::info!(phase = %$name, "========================================");
    };
}

/// Log a section within a test phase.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        tracing::debug!(section = %$name, "--- {} ---", $name);
    };
}

/// Log test completion with summary.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            test = %$name,
            $($key = %$value,)*
            "test completed successfully: {}",
            $name
        );
    };
}

/// Assert that an outcome is fulfilled with a specific value.
#[macro_export]
macro_rules! assert_fulfilled {
    ($outcome:expr, $expected:expr) => {
        match $outcome {
            $crate::Outcome {
                status: $crate::State::Fulfilled,
                value,
            } => assert_eq!(value, $crate::Value::from($expected)),
            other => unreachable!("expected fulfilled({:?}), got {}", $expected, other),
        }
    };
}

/// Assert that an outcome is rejected, optionally with a specific reason.
#[macro_export]
macro_rules! assert_rejected {
    ($outcome:expr) => {
        match $outcome {
            $crate::Outcome {
                status: $crate::State::Rejected,
                ..
            } => {}
            other => unreachable!("expected rejected, got {}", other),
        }
    };
    ($outcome:expr, $expected:expr) => {
        match $outcome {
            $crate::Outcome {
                status: $crate::State::Rejected,
                value,
            } => assert_eq!(value, $crate::Value::from($expected)),
            other => unreachable!("expected rejected({:?}), got {}", $expected, other),
        }
    };
}
