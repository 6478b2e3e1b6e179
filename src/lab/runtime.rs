//! Lab runtime for deterministic execution.
//!
//! The lab runtime is a single-threaded event loop over virtual time:
//! - Timer callbacks are macrotasks, fired one per step in deadline order
//! - The microtask queue is drained to exhaustion before every macrotask and
//!   after each one
//! - Time only moves when the loop jumps to the next deadline, or when a
//!   [`LabRuntime::run_for`] window closes
//!
//! A run therefore depends on nothing but the order in which work was
//! scheduled.

use super::config::LabConfig;
use super::timer::TimerHeap;
use crate::error::{LabError, LabResult};
use crate::future::Future;
use crate::runtime::microtask::{self, DrainReport};
use crate::tracing_compat::{debug, debug_span, trace, warn};
use crate::types::{Outcome, Time, TimerId, Value};
use slab::Slab;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

type TimerCallback = Box<dyn FnOnce()>;

struct TimerSlot {
    generation: u64,
    deadline: Time,
    callback: TimerCallback,
}

struct LabState {
    now: Time,
    timers: TimerHeap,
    slots: Slab<TimerSlot>,
    next_generation: u64,
}

impl LabState {
    /// Drops heap entries whose slot was cancelled, then reports the next
    /// live timer.
    fn next_live(&mut self) -> Option<(TimerId, Time)> {
        while let Some((timer, deadline)) = self.timers.peek() {
            if self.is_live(timer) {
                return Some((timer, deadline));
            }
            self.timers.pop();
        }
        None
    }

    fn is_live(&self, timer: TimerId) -> bool {
        self.slots
            .get(timer.slot)
            .is_some_and(|slot| slot.generation == timer.generation)
    }
}

/// A cloneable handle for scheduling timers from inside callbacks.
///
/// Every handle obtained from one [`LabRuntime`] shares its clock and timer
/// queue.
#[derive(Clone)]
pub struct LabHandle {
    state: Rc<RefCell<LabState>>,
}

impl LabHandle {
    /// Returns the current virtual time.
    #[must_use]
    pub fn now(&self) -> Time {
        self.state.borrow().now
    }

    /// Returns the number of timers that have not fired or been cancelled.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.state.borrow().slots.len()
    }

    /// Schedules `callback` as a macrotask `after` the current virtual time.
    pub fn set_timeout<F>(&self, after: Duration, callback: F) -> TimerId
    where
        F: FnOnce() + 'static,
    {
        let mut state = self.state.borrow_mut();
        let deadline = state.now + after;
        let generation = state.next_generation;
        state.next_generation += 1;
        let slot = state.slots.insert(TimerSlot {
            generation,
            deadline,
            callback: Box::new(callback),
        });
        let timer = TimerId { slot, generation };
        state.timers.insert(timer, deadline);
        trace!(timer = %timer, deadline = %deadline, "timer scheduled");
        timer
    }

    /// Cancels a timer. Returns false if it already fired or was cancelled.
    pub fn cancel_timer(&self, timer: TimerId) -> bool {
        let cancelled = {
            let mut state = self.state.borrow_mut();
            if !state.is_live(timer) {
                return false;
            }
            state.slots.remove(timer.slot)
        };
        // The callback may own the last handle to a future.
        drop(cancelled);
        trace!(timer = %timer, "timer cancelled");
        true
    }

    /// A future fulfilled with `value` once `after` has elapsed.
    pub fn delay(&self, after: Duration, value: impl Into<Value>) -> Future {
        let value = value.into();
        let handle = self.clone();
        Future::new(move |complete, _| {
            handle.set_timeout(after, move || complete.call(value));
        })
    }

    /// A future rejected with `reason` once `after` has elapsed.
    pub fn delay_reject(&self, after: Duration, reason: impl Into<Value>) -> Future {
        let reason = reason.into();
        let handle = self.clone();
        Future::new(move |_, fail| {
            handle.set_timeout(after, move || fail.call(reason));
        })
    }

    /// Removes the next live timer, advancing the clock to its deadline.
    fn take_next(&self) -> Option<(TimerId, TimerCallback)> {
        let mut state = self.state.borrow_mut();
        let (timer, deadline) = state.next_live()?;
        state.timers.pop();
        let slot = state.slots.remove(timer.slot);
        debug_assert_eq!(slot.deadline, deadline);
        if deadline > state.now {
            state.now = deadline;
        }
        Some((timer, slot.callback))
    }

    fn next_deadline(&self) -> Option<Time> {
        self.state.borrow_mut().next_live().map(|(_, deadline)| deadline)
    }

    fn advance_to(&self, time: Time) {
        let mut state = self.state.borrow_mut();
        if time > state.now {
            state.now = time;
        }
    }
}

impl fmt::Debug for LabHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_borrow() {
            Ok(state) => f
                .debug_struct("LabHandle")
                .field("now", &state.now)
                .field("pending_timers", &state.slots.len())
                .finish(),
            Err(_) => f.debug_struct("LabHandle").finish_non_exhaustive(),
        }
    }
}

/// A fired timer, recorded when [`LabConfig::trace_events`] is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabEvent {
    /// Step number (1-based) at which the timer fired.
    pub step: u64,
    /// Virtual time at which it fired.
    pub time: Time,
    /// The timer.
    pub timer: TimerId,
    /// Microtasks drained after the callback.
    pub microtasks: u64,
}

/// Summary of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabRunReport {
    /// Macrotasks fired during the run.
    pub steps: u64,
    /// Microtasks executed during the run.
    pub microtasks: u64,
    /// Virtual time when the run stopped.
    pub now: Time,
}

/// The deterministic lab runtime.
///
/// ```
/// use settle::{Future, LabRuntime, Value};
/// use std::time::Duration;
///
/// let mut lab = LabRuntime::default();
/// let slow = lab.delay(Duration::from_millis(20), "slow");
/// let fast = lab.delay(Duration::from_millis(10), "fast");
/// let winner = Future::race_of([slow, fast]);
///
/// let outcome = lab.run_until_settled(&winner).unwrap();
/// assert_eq!(outcome.value, Value::from("fast"));
/// assert_eq!(lab.now().as_millis(), 10);
/// ```
pub struct LabRuntime {
    config: LabConfig,
    handle: LabHandle,
    steps: u64,
    events: Vec<LabEvent>,
}

impl LabRuntime {
    /// Creates a new lab runtime with the given configuration.
    #[must_use]
    pub fn new(config: LabConfig) -> Self {
        let handle = LabHandle {
            state: Rc::new(RefCell::new(LabState {
                now: config.start_time,
                timers: TimerHeap::new(),
                slots: Slab::new(),
                next_generation: 0,
            })),
        };
        Self {
            config,
            handle,
            steps: 0,
            events: Vec::new(),
        }
    }

    /// Returns a reference to the configuration.
    #[must_use]
    pub const fn config(&self) -> &LabConfig {
        &self.config
    }

    /// Returns a handle sharing this runtime's clock and timers.
    #[must_use]
    pub fn handle(&self) -> LabHandle {
        self.handle.clone()
    }

    /// Returns the current virtual time.
    #[must_use]
    pub fn now(&self) -> Time {
        self.handle.now()
    }

    /// Returns the number of macrotasks executed.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// Returns the number of timers still scheduled.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.handle.pending_timers()
    }

    /// Returns true when no microtasks or timers remain.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        microtask::pending_microtasks() == 0 && self.pending_timers() == 0
    }

    /// Returns the recorded timer events.
    #[must_use]
    pub fn events(&self) -> &[LabEvent] {
        &self.events
    }

    /// See [`LabHandle::set_timeout`].
    pub fn set_timeout<F>(&self, after: Duration, callback: F) -> TimerId
    where
        F: FnOnce() + 'static,
    {
        self.handle.set_timeout(after, callback)
    }

    /// See [`LabHandle::cancel_timer`].
    pub fn cancel_timer(&self, timer: TimerId) -> bool {
        self.handle.cancel_timer(timer)
    }

    /// See [`LabHandle::delay`].
    pub fn delay(&self, after: Duration, value: impl Into<Value>) -> Future {
        self.handle.delay(after, value)
    }

    /// See [`LabHandle::delay_reject`].
    pub fn delay_reject(&self, after: Duration, reason: impl Into<Value>) -> Future {
        self.handle.delay_reject(after, reason)
    }

    /// Drains the microtask queue, honoring `max_microtasks_per_turn`.
    ///
    /// Returns the number of microtasks executed.
    pub fn run_microtasks(&self) -> LabResult<u64> {
        let Some(limit) = self.config.max_microtasks_per_turn else {
            return Ok(microtask::run_microtasks());
        };
        let DrainReport {
            executed,
            remaining,
        } = microtask::run_microtasks_with_limit(limit);
        if remaining > 0 {
            warn!(executed, remaining, "microtask limit exceeded");
            return Err(LabError::MicrotaskLimitExceeded {
                executed,
                remaining,
            });
        }
        Ok(executed)
    }

    /// Runs one turn: drains microtasks, fires the next timer, drains again.
    ///
    /// Returns the fired timer, or `None` when no timer is scheduled.
    ///
    /// # Panics
    ///
    /// Timer callbacks are not guarded: a panic in one propagates to the
    /// caller. The runtime stays usable afterwards.
    pub fn step(&mut self) -> LabResult<Option<TimerId>> {
        self.run_microtasks()?;
        Ok(self.fire_next()?.map(|(timer, _)| timer))
    }

    /// Runs until no microtasks or timers remain.
    pub fn run_until_idle(&mut self) -> LabResult<LabRunReport> {
        let _span = debug_span!("lab_run_until_idle").entered();
        let start_steps = self.steps;
        let mut microtasks = self.run_microtasks()?;
        while let Some((_, drained)) = self.fire_next()? {
            microtasks += drained;
        }
        Ok(self.report(start_steps, microtasks))
    }

    /// Fires every timer due within `duration` of now, then moves the clock
    /// to the end of that window.
    pub fn run_for(&mut self, duration: Duration) -> LabResult<LabRunReport> {
        let start_steps = self.steps;
        let until = self.now() + duration;
        let mut microtasks = self.run_microtasks()?;
        while self
            .handle
            .next_deadline()
            .is_some_and(|deadline| deadline <= until)
        {
            if let Some((_, drained)) = self.fire_next()? {
                microtasks += drained;
            }
        }
        self.handle.advance_to(until);
        Ok(self.report(start_steps, microtasks))
    }

    /// Runs until `future` settles and returns its outcome.
    ///
    /// Fails with [`LabError::Unsettled`] when the future is still pending and
    /// nothing is left that could settle it.
    pub fn run_until_settled(&mut self, future: &Future) -> LabResult<Outcome> {
        self.run_microtasks()?;
        loop {
            if let Some(outcome) = future.outcome() {
                return Ok(outcome);
            }
            if self.fire_next()?.is_none() {
                return Err(LabError::Unsettled { id: future.id() });
            }
        }
    }

    /// Fires the next timer and drains the microtasks it produced.
    ///
    /// The microtask queue must already be empty. A panicking callback
    /// unwinds out of the loop; by then the timer is removed and the step is
    /// counted, but no event is recorded for it.
    fn fire_next(&mut self) -> LabResult<Option<(TimerId, u64)>> {
        self.check_step_limit()?;
        let Some((timer, callback)) = self.handle.take_next() else {
            return Ok(None);
        };
        self.steps += 1;
        let now = self.now();
        debug!(step = self.steps, timer = %timer, now = %now, "timer fired");
        callback();
        let microtasks = self.run_microtasks()?;
        if self.config.trace_events {
            self.events.push(LabEvent {
                step: self.steps,
                time: now,
                timer,
                microtasks,
            });
        }
        Ok(Some((timer, microtasks)))
    }

    fn check_step_limit(&self) -> LabResult<()> {
        match self.config.max_steps {
            Some(max) if self.steps >= max && self.pending_timers() > 0 => {
                warn!(steps = self.steps, max, "lab step limit exceeded");
                Err(LabError::StepLimitExceeded { steps: self.steps })
            }
            _ => Ok(()),
        }
    }

    fn report(&self, start_steps: u64, microtasks: u64) -> LabRunReport {
        LabRunReport {
            steps: self.steps - start_steps,
            microtasks,
            now: self.now(),
        }
    }
}

impl Default for LabRuntime {
    fn default() -> Self {
        Self::new(LabConfig::default())
    }
}

impl fmt::Debug for LabRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabRuntime")
            .field("config", &self.config)
            .field("handle", &self.handle)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}
