//! Reaction handlers and fault capture.
//!
//! User callbacks "raise" either by returning `Err(reason)` or by panicking.
//! Both are turned into a rejection reason here so that nothing escapes into
//! the microtask queue.

use super::Future;
use crate::error::AggregateError;
use crate::types::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// A boxed reaction callback, as accepted by [`Future::react`].
pub type Handler = Box<dyn FnOnce(Value) -> Result<Value, Value>>;

/// Reason used when a panic payload is neither `&str` nor `String`.
pub const OPAQUE_PANIC_REASON: &str = "panic";

/// Conversion of a callback's return into a fulfillment value or a raised
/// reason.
pub trait IntoReaction {
    /// `Ok` fulfills, `Err` rejects.
    fn into_reaction(self) -> Result<Value, Value>;
}

impl<T, E> IntoReaction for Result<T, E>
where
    T: Into<Value>,
    E: Into<Value>,
{
    fn into_reaction(self) -> Result<Value, Value> {
        self.map(Into::into).map_err(Into::into)
    }
}

impl IntoReaction for &str {
    fn into_reaction(self) -> Result<Value, Value> {
        Ok(Value::from(self))
    }
}

macro_rules! impl_into_reaction {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoReaction for $ty {
                fn into_reaction(self) -> Result<Value, Value> {
                    Ok(Value::from(self))
                }
            }
        )*
    };
}

impl_into_reaction!(
    Value,
    (),
    bool,
    i32,
    i64,
    u32,
    f64,
    String,
    Vec<Value>,
    AggregateError,
    Future,
);

/// Boxes a closure into a [`Handler`].
pub fn handler<F, R>(f: F) -> Handler
where
    F: FnOnce(Value) -> R + 'static,
    R: IntoReaction,
{
    Box::new(move |value| f(value).into_reaction())
}

/// Runs `f`, converting a panic into `Err(reason)`.
pub(crate) fn guard<T>(f: impl FnOnce() -> Result<T, Value>) -> Result<T, Value> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(panic_reason(payload.as_ref())),
    }
}

/// Extracts a rejection reason from a panic payload.
pub(crate) fn panic_reason(payload: &(dyn Any + Send)) -> Value {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        Value::from(*msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        Value::from(msg.as_str())
    } else {
        Value::from(OPAQUE_PANIC_REASON)
    }
}
