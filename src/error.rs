//! Error types.
//!
//! Failures of a future never surface as Rust errors: they travel through the
//! rejection channel as [`Value`]s. The types here are the ones that do need a
//! Rust shape:
//!
//! - [`AggregateError`]: the composite rejection reason produced by `any_of`
//!   when every input rejects (carried as [`Value::Aggregate`]).
//! - [`LabError`]: failures of the lab event loop itself (step limits,
//!   futures that can never settle).

use crate::types::{FutureId, Value};
use thiserror::Error;

/// Message used by `any_of` when every input rejected.
pub const ALL_REJECTED_MESSAGE: &str = "All promises were rejected";

/// A rejection reason bundling several underlying reasons.
///
/// `errors` is index-aligned with the inputs that produced it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct AggregateError {
    errors: Vec<Value>,
    message: String,
}

impl AggregateError {
    /// Creates an aggregate error with an explicit message.
    #[must_use]
    pub fn new(errors: Vec<Value>, message: impl Into<String>) -> Self {
        Self {
            errors,
            message: message.into(),
        }
    }

    /// Creates the aggregate error `any_of` reports when every input rejected.
    #[must_use]
    pub fn all_rejected(errors: Vec<Value>) -> Self {
        Self::new(errors, ALL_REJECTED_MESSAGE)
    }

    /// Returns the underlying reasons.
    #[must_use]
    pub fn errors(&self) -> &[Value] {
        &self.errors
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the number of bundled reasons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true when no reasons are bundled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Errors raised by the lab event loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabError {
    /// More macrotasks ran than `LabConfig::max_steps` allows.
    #[error("lab step limit exceeded after {steps} macrotasks")]
    StepLimitExceeded {
        /// Macrotasks executed before the limit tripped.
        steps: u64,
    },
    /// A single turn ran more microtasks than `LabConfig::max_microtasks_per_turn`.
    #[error("microtask limit exceeded: {executed} microtasks in one turn, {remaining} still queued")]
    MicrotaskLimitExceeded {
        /// Microtasks executed in the turn.
        executed: u64,
        /// Microtasks left in the queue.
        remaining: usize,
    },
    /// The awaited future is still pending and nothing is left to run.
    #[error("{id} is still pending and no timers remain")]
    Unsettled {
        /// The future that never settled.
        id: FutureId,
    },
}

/// Result type for lab operations.
pub type LabResult<T> = Result<T, LabError>;
