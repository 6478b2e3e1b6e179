//! The future contract, as a capability.
//!
//! Completing a future with a value that implements [`Thenable`] makes the
//! future adopt that value's eventual outcome instead of fulfilling with the
//! object itself. [`Future`](super::Future) implements it; so can any other
//! producer of deferred values (a host-runtime promise wrapper, a test
//! double).

use crate::types::Value;
use std::fmt;

/// A one-shot settlement callback.
pub type Settler = Box<dyn FnOnce(Value)>;

/// Something that settles later and can report how it settled.
pub trait Thenable: fmt::Debug {
    /// Registers callbacks for the two outcomes.
    ///
    /// Implementations must call at most one of them, at most once, and
    /// should call it asynchronously. Extra calls are ignored by the adopting
    /// future.
    fn subscribe(&self, on_fulfilled: Settler, on_rejected: Settler);

    /// Address identifying the underlying deferred value.
    ///
    /// Handles to the same value must agree. Used for equality of
    /// [`Value::Thenable`] and to reject a future adopting itself.
    fn identity(&self) -> *const () {
        std::ptr::from_ref(self).cast()
    }
}
