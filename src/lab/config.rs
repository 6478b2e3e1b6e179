//! Configuration for the lab runtime.
//!
//! The lab configuration bounds a deterministic run:
//! - How many macrotasks (timer callbacks) may run before the loop gives up
//! - How many microtasks a single turn may execute
//! - The virtual instant the run starts at

use crate::types::Time;

/// Configuration for the lab runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabConfig {
    /// Maximum number of macrotasks before the run is aborted.
    pub max_steps: Option<u64>,
    /// Maximum number of microtasks drained in one turn.
    ///
    /// `None` drains to exhaustion. A bound turns a reaction chain that keeps
    /// scheduling itself into a [`LabError`](crate::LabError) instead of a hang.
    pub max_microtasks_per_turn: Option<u64>,
    /// Virtual time at which the run starts.
    pub start_time: Time,
    /// Whether fired timers are recorded in the runtime's event log.
    pub trace_events: bool,
}

impl LabConfig {
    /// Creates the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_steps: Some(100_000),
            max_microtasks_per_turn: None,
            start_time: Time::ZERO,
            trace_events: false,
        }
    }

    /// Sets the maximum number of macrotasks.
    #[must_use]
    pub const fn max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    /// Disables the step limit.
    #[must_use]
    pub const fn no_step_limit(mut self) -> Self {
        self.max_steps = None;
        self
    }

    /// Bounds the microtasks drained per turn.
    #[must_use]
    pub const fn max_microtasks_per_turn(mut self, limit: u64) -> Self {
        self.max_microtasks_per_turn = Some(limit);
        self
    }

    /// Sets the starting virtual time.
    #[must_use]
    pub const fn start_time(mut self, time: Time) -> Self {
        self.start_time = time;
        self
    }

    /// Enables or disables the event log.
    #[must_use]
    pub const fn trace_events(mut self, value: bool) -> Self {
        self.trace_events = value;
        self
    }
}

impl Default for LabConfig {
    fn default() -> Self {
        Self::new()
    }
}
