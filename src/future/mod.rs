//! The future state machine.
//!
//! A [`Future`] is created `Pending` by [`Future::new`], whose initializer
//! receives the [`Complete`] and [`Fail`] capabilities. It settles at most
//! once, to `Fulfilled` or `Rejected`, and the payload never changes after
//! that.
//!
//! Reactions registered with [`Future::react`] (and the `then` / `recover` /
//! `always` sugar) are queued per outcome kind and invoked in registration
//! order once the future settles. Settlement and reaction delivery always go
//! through the microtask queue, even when the value is available right away.
//!
//! ```
//! use settle::{Future, Value, runtime::run_microtasks};
//!
//! let doubled = Future::resolve_with(21).then(|v| v.as_int().unwrap_or(0) * 2);
//! assert!(doubled.is_pending());
//!
//! run_microtasks();
//! assert_eq!(doubled.value(), Some(Value::Int(42)));
//! ```
//!
//! # Chaining
//!
//! `react` returns a new child future. A handler that returns a value
//! fulfills the child; one that returns `Err` or panics rejects it. A handler
//! that returns a thenable (another [`Future`], or any [`Thenable`]) makes
//! the child adopt that thenable's outcome.

mod capability;
pub mod reaction;
mod thenable;

pub use capability::{Complete, Fail};
pub use reaction::{Handler, IntoReaction, handler};
pub use thenable::{Settler, Thenable};

use crate::combinator;
use crate::runtime::CallbackQueue;
use crate::runtime::microtask::defer;
use crate::tracing_compat::trace;
use crate::types::{FutureId, Outcome, State, Value};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Reason used when a future is completed with itself.
pub const CHAINING_CYCLE_REASON: &str = "chaining cycle detected for future";

type Reaction = Box<dyn FnOnce(Value)>;

struct Inner {
    id: FutureId,
    state: State,
    value: Value,
    /// Set by the first `complete`/`fail` unit to run; later units are no-ops.
    claimed: bool,
    fulfillment: CallbackQueue<Reaction>,
    rejection: CallbackQueue<Reaction>,
}

/// A deferred value.
///
/// Cloning produces another handle to the same future.
#[derive(Clone)]
pub struct Future {
    inner: Rc<RefCell<Inner>>,
}

impl Future {
    /// Creates a future and runs `initializer` synchronously with its
    /// settlement capabilities.
    ///
    /// If the initializer returns `Err(reason)` or panics, the future is
    /// failed with that reason.
    pub fn new<F, R>(initializer: F) -> Self
    where
        F: FnOnce(Complete, Fail) -> R,
        R: IntoReaction,
    {
        let future = Self {
            inner: Rc::new(RefCell::new(Inner {
                id: FutureId::next(),
                state: State::Pending,
                value: Value::Undefined,
                claimed: false,
                fulfillment: CallbackQueue::new(),
                rejection: CallbackQueue::new(),
            })),
        };
        trace!(id = %future.id(), "future created");

        let complete = Complete::new(Rc::clone(&future.inner));
        let fail = Fail::new(Rc::clone(&future.inner));
        let fault = fail.clone();
        if let Err(reason) = reaction::guard(move || initializer(complete, fail).into_reaction()) {
            fault.call(reason);
        }
        future
    }

    /// A future completed with `value` (adopting it if it is a thenable).
    pub fn resolve_with(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self::new(move |complete, _| complete.call(value))
    }

    /// A future failed with `reason`.
    pub fn reject_with(reason: impl Into<Value>) -> Self {
        let reason = reason.into();
        Self::new(move |_, fail| fail.call(reason))
    }

    /// A future that adopts the outcome of a foreign thenable.
    pub fn from_thenable(thenable: Rc<dyn Thenable>) -> Self {
        Self::resolve_with(Value::Thenable(thenable))
    }

    /// See [`combinator::all_of`].
    pub fn all_of(futures: impl IntoIterator<Item = Future>) -> Self {
        combinator::all_of(futures)
    }

    /// See [`combinator::all_settled`].
    pub fn all_settled(futures: impl IntoIterator<Item = Future>) -> Self {
        combinator::all_settled(futures)
    }

    /// See [`combinator::race_of`].
    pub fn race_of(futures: impl IntoIterator<Item = Future>) -> Self {
        combinator::race_of(futures)
    }

    /// See [`combinator::any_of`].
    pub fn any_of(futures: impl IntoIterator<Item = Future>) -> Self {
        combinator::any_of(futures)
    }

    /// Registers reactions and returns the child future they settle.
    ///
    /// A missing `on_fulfilled` passes the value through; a missing
    /// `on_rejected` passes the rejection through.
    pub fn react(&self, on_fulfilled: Option<Handler>, on_rejected: Option<Handler>) -> Future {
        Future::new(|complete, fail| {
            let (complete_on_reject, fail_on_reject) = (complete.clone(), fail.clone());
            let fulfilled: Reaction = Box::new(move |value| match on_fulfilled {
                Some(handler) => settle_child(handler, value, &complete, &fail),
                None => complete.call(value),
            });
            let rejected: Reaction = Box::new(move |reason| match on_rejected {
                Some(handler) => settle_child(handler, reason, &complete_on_reject, &fail_on_reject),
                None => fail_on_reject.call(reason),
            });
            self.register(fulfilled, rejected);
        })
    }

    /// Reacts to fulfillment only.
    pub fn then<F, R>(&self, on_fulfilled: F) -> Future
    where
        F: FnOnce(Value) -> R + 'static,
        R: IntoReaction,
    {
        self.react(Some(handler(on_fulfilled)), None)
    }

    /// Reacts to both outcomes.
    pub fn then_or<F, R, G, S>(&self, on_fulfilled: F, on_rejected: G) -> Future
    where
        F: FnOnce(Value) -> R + 'static,
        R: IntoReaction,
        G: FnOnce(Value) -> S + 'static,
        S: IntoReaction,
    {
        self.react(Some(handler(on_fulfilled)), Some(handler(on_rejected)))
    }

    /// Reacts to rejection only; `recover(f)` is `react(None, Some(f))`.
    pub fn recover<G, S>(&self, on_rejected: G) -> Future
    where
        G: FnOnce(Value) -> S + 'static,
        S: IntoReaction,
    {
        self.react(None, Some(handler(on_rejected)))
    }

    /// Runs `finalizer` on either outcome, then passes the original value or
    /// rejection through. If the finalizer raises, its reason wins.
    pub fn always<F, R>(&self, finalizer: F) -> Future
    where
        F: FnOnce() -> R + 'static,
        R: IntoReaction,
    {
        let on_fulfilled = Rc::new(Cell::new(Some(finalizer)));
        let on_rejected = Rc::clone(&on_fulfilled);
        self.react(
            Some(Box::new(move |value| -> Result<Value, Value> {
                run_finalizer(&on_fulfilled)?;
                Ok(value)
            })),
            Some(Box::new(move |reason| -> Result<Value, Value> {
                run_finalizer(&on_rejected)?;
                Err(reason)
            })),
        )
    }

    /// Returns this future's id.
    #[must_use]
    pub fn id(&self) -> FutureId {
        self.inner.borrow().id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> State {
        self.inner.borrow().state
    }

    /// Returns true while pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state().is_pending()
    }

    /// Returns true once fulfilled.
    #[must_use]
    pub fn is_fulfilled(&self) -> bool {
        self.state().is_fulfilled()
    }

    /// Returns true once rejected.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.state().is_rejected()
    }

    /// Returns the settled payload, or `None` while pending.
    #[must_use]
    pub fn value(&self) -> Option<Value> {
        let inner = self.inner.borrow();
        inner.state.is_settled().then(|| inner.value.clone())
    }

    /// Returns the outcome, or `None` while pending.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        let inner = self.inner.borrow();
        inner.state.is_settled().then(|| Outcome {
            status: inner.state,
            value: inner.value.clone(),
        })
    }

    /// Returns the number of queued, not yet delivered reactions.
    #[must_use]
    pub fn queued_reactions(&self) -> usize {
        let inner = self.inner.borrow();
        match inner.state {
            State::Pending | State::Fulfilled => inner.fulfillment.len(),
            State::Rejected => inner.rejection.len(),
        }
    }

    /// Queues a raw reaction pair. Already-settled futures schedule a drain.
    fn register(&self, fulfilled: Reaction, rejected: Reaction) {
        let settled = {
            let mut inner = self.inner.borrow_mut();
            match inner.state {
                State::Pending => {
                    inner.fulfillment.push(fulfilled);
                    inner.rejection.push(rejected);
                    false
                }
                State::Fulfilled => {
                    inner.fulfillment.push(fulfilled);
                    true
                }
                State::Rejected => {
                    inner.rejection.push(rejected);
                    true
                }
            }
        };
        if settled {
            let target = Rc::clone(&self.inner);
            defer(move || drain(&target));
        }
    }
}

impl Thenable for Future {
    fn subscribe(&self, on_fulfilled: Settler, on_rejected: Settler) {
        self.register(on_fulfilled, on_rejected);
    }

    fn identity(&self) -> *const () {
        Rc::as_ptr(&self.inner).cast()
    }
}

impl From<Future> for Value {
    fn from(future: Future) -> Self {
        Self::Thenable(Rc::new(future))
    }
}

impl fmt::Debug for Future {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("Future")
                .field("id", &inner.id)
                .field("state", &inner.state)
                .finish_non_exhaustive(),
            Err(_) => f.debug_struct("Future").finish_non_exhaustive(),
        }
    }
}

impl fmt::Display for Future {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => write!(f, "{}", inner.id),
            Err(_) => f.write_str("Future(?)"),
        }
    }
}

fn settle_child(handler: Handler, input: Value, complete: &Complete, fail: &Fail) {
    match reaction::guard(move || handler(input)) {
        Ok(value) => complete.call(value),
        Err(reason) => fail.call(reason),
    }
}

fn run_finalizer<F, R>(slot: &Cell<Option<F>>) -> Result<(), Value>
where
    F: FnOnce() -> R,
    R: IntoReaction,
{
    match slot.take() {
        Some(finalizer) => finalizer().into_reaction().map(drop),
        None => Ok(()),
    }
}

/// Claims the right to settle. Only the first claim succeeds.
fn claim(target: &Rc<RefCell<Inner>>) -> bool {
    let mut inner = target.borrow_mut();
    if inner.claimed {
        trace!(id = %inner.id, state = %inner.state, "ignoring repeated settlement");
        return false;
    }
    inner.claimed = true;
    true
}

fn resolve(target: &Rc<RefCell<Inner>>, value: Value) {
    if claim(target) {
        settle_or_adopt(target, value);
    }
}

fn reject(target: &Rc<RefCell<Inner>>, reason: Value) {
    if claim(target) {
        transition(target, State::Rejected, reason);
    }
}

fn settle_or_adopt(target: &Rc<RefCell<Inner>>, value: Value) {
    let Value::Thenable(thenable) = value else {
        transition(target, State::Fulfilled, value);
        return;
    };

    if std::ptr::eq(thenable.identity(), Rc::as_ptr(target).cast()) {
        transition(target, State::Rejected, Value::from(CHAINING_CYCLE_REASON));
        return;
    }

    trace!(id = %target.borrow().id, adopted = ?thenable, "adopting thenable");
    let on_fulfilled = Rc::clone(target);
    let on_rejected = Rc::clone(target);
    let subscribed = reaction::guard(|| {
        thenable.subscribe(
            Box::new(move |value| settle_or_adopt(&on_fulfilled, value)),
            Box::new(move |reason| transition(&on_rejected, State::Rejected, reason)),
        );
        Ok(())
    });
    // A settler that already ran wins over the fault.
    if let Err(reason) = subscribed {
        transition(target, State::Rejected, reason);
    }
}

fn transition(target: &Rc<RefCell<Inner>>, state: State, value: Value) {
    let discarded = {
        let mut inner = target.borrow_mut();
        if inner.state.is_settled() {
            return;
        }
        inner.state = state;
        inner.value = value;
        trace!(id = %inner.id, state = %state, "future settled");
        // The other outcome's reactions can never run.
        match state {
            State::Fulfilled => inner.rejection.take(),
            State::Rejected => {
                if inner.rejection.is_empty() {
                    trace!(id = %inner.id, "future rejected with no rejection reactions");
                }
                inner.fulfillment.take()
            }
            State::Pending => CallbackQueue::new(),
        }
    };
    drop(discarded);
    drain(target);
}

fn drain(target: &Rc<RefCell<Inner>>) {
    loop {
        let next = {
            let mut guard = target.borrow_mut();
            let inner = &mut *guard;
            let queue = match inner.state {
                State::Pending => return,
                State::Fulfilled => &mut inner.fulfillment,
                State::Rejected => &mut inner.rejection,
            };
            queue.pop().map(|reaction| (reaction, inner.value.clone()))
        };
        // Reactions may register more reactions on this future.
        let Some((reaction, value)) = next else {
            return;
        };
        reaction(value);
    }
}
