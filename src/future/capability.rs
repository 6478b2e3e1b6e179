//! Settlement capabilities.
//!
//! [`Complete`] and [`Fail`] are handed to a future's initializer and are the
//! only way to move it out of `Pending`. Both defer their effect: the state
//! check happens inside the queued unit, so several calls made before the
//! first unit runs are all queued, and only the first one takes effect.

use super::{Inner, reject, resolve};
use crate::runtime::microtask::defer;
use crate::types::{FutureId, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Capability that fulfills (or, for thenables, adopts into) its future.
#[derive(Clone)]
pub struct Complete {
    target: Rc<RefCell<Inner>>,
}

/// Capability that rejects its future.
#[derive(Clone)]
pub struct Fail {
    target: Rc<RefCell<Inner>>,
}

impl Complete {
    pub(super) fn new(target: Rc<RefCell<Inner>>) -> Self {
        Self { target }
    }

    /// Completes the future with `value`.
    ///
    /// A thenable value is adopted: the future settles the way the thenable
    /// does. A no-op if the future already settled or started adopting by
    /// the time the deferred unit runs.
    pub fn call(&self, value: impl Into<Value>) {
        let target = Rc::clone(&self.target);
        let value = value.into();
        defer(move || resolve(&target, value));
    }

    /// Returns the id of the future this capability settles.
    #[must_use]
    pub fn future_id(&self) -> FutureId {
        self.target.borrow().id
    }
}

impl Fail {
    pub(super) fn new(target: Rc<RefCell<Inner>>) -> Self {
        Self { target }
    }

    /// Rejects the future with `reason`. Thenable reasons are not adopted.
    pub fn call(&self, reason: impl Into<Value>) {
        let target = Rc::clone(&self.target);
        let reason = reason.into();
        defer(move || reject(&target, reason));
    }

    /// Returns the id of the future this capability settles.
    #[must_use]
    pub fn future_id(&self) -> FutureId {
        self.target.borrow().id
    }
}

impl fmt::Debug for Complete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Complete").field(&self.future_id()).finish()
    }
}

impl fmt::Debug for Fail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Fail").field(&self.future_id()).finish()
    }
}
