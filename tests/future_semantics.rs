//! Integration tests for the future state machine: settlement, ordering,
//! chaining, fault capture and flattening.

mod common;

use common::{Log, deferred, init_test_logging, settle_now};
use settle::runtime::{pending_microtasks, run_microtasks};
use settle::{Future, Outcome, State, Thenable, Value, assert_fulfilled, assert_rejected};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

fn init_test(name: &str) {
    init_test_logging();
    settle::test_phase!(name);
}

#[test]
fn only_the_first_settlement_counts() {
    init_test("only_the_first_settlement_counts");
    let future = Future::new(|complete, fail| {
        complete.call(1);
        complete.call(2);
        fail.call("late");
    });
    assert_fulfilled!(settle_now(&future), 1);

    let (future, complete, fail) = deferred();
    fail.call("first");
    complete.call("second");
    fail.call("third");
    assert_rejected!(settle_now(&future), "first");
    settle::test_complete!("only_the_first_settlement_counts");
}

#[test]
fn reactions_fire_in_registration_order() {
    init_test("reactions_fire_in_registration_order");
    let log = Log::new();
    let (future, complete, _) = deferred();
    for n in 0..5 {
        let log = log.clone();
        future.then(move |_| log.push(n));
    }
    complete.call(());
    run_microtasks();
    assert_eq!(log.snapshot(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn rejection_reactions_fire_in_registration_order() {
    let log = Log::new();
    let future = Future::reject_with("E");
    for n in 0..3 {
        let log = log.clone();
        future.recover(move |_| log.push(n));
    }
    run_microtasks();
    assert_eq!(log.snapshot(), vec![0, 1, 2]);
}

#[test]
fn delivery_is_never_synchronous() {
    init_test("delivery_is_never_synchronous");
    let log = Log::new();
    let sink = log.clone();
    let future = Future::resolve_with(1);
    future.then(move |_| sink.push("reaction"));
    log.push("sync");
    assert!(future.is_pending());
    assert!(pending_microtasks() > 0);

    run_microtasks();
    assert_eq!(log.snapshot(), vec!["sync", "reaction"]);

    // Registration on an already settled future is still deferred.
    let sink = log.clone();
    future.then(move |_| sink.push("late"));
    log.push("sync again");
    run_microtasks();
    assert_eq!(
        log.snapshot(),
        vec!["sync", "reaction", "sync again", "late"]
    );
}

#[test]
fn chaining_transforms_values() {
    let chained = Future::resolve_with(1).then(|v| v.as_int().unwrap_or(0) + 1);
    assert_fulfilled!(settle_now(&chained), 2);

    let long = (0..10).fold(Future::resolve_with(0), |future, _| {
        future.then(|v| v.as_int().unwrap_or(0) + 1)
    });
    assert_fulfilled!(settle_now(&long), 10);
}

#[test]
fn rejection_propagates_past_fulfillment_only_reactions() {
    init_test("rejection_propagates_past_fulfillment_only_reactions");
    let touched = Rc::new(Cell::new(false));
    let flag = Rc::clone(&touched);
    let recovered = Future::reject_with("E")
        .then(move |v| {
            flag.set(true);
            v
        })
        .then(|v| v)
        .recover(|reason| {
            format!("recovered from {reason}")
        });
    assert_fulfilled!(settle_now(&recovered), "recovered from E");
    assert!(!touched.get());
}

#[test]
fn raised_errors_become_rejections() {
    let child = Future::resolve_with(1).then(|_| Err::<Value, _>("X"));
    assert_rejected!(settle_now(&child), "X");

    let initializer = Future::new(|_, _| Err::<(), _>("init"));
    assert_rejected!(settle_now(&initializer), "init");
}

#[test]
fn panics_become_rejections() {
    init_test("panics_become_rejections");
    let child = Future::resolve_with(1).then(|_| -> Value { panic!("reaction exploded") });
    assert_rejected!(settle_now(&child), "reaction exploded");

    let recovered = Future::reject_with(0).recover(|_| -> i64 { panic!("recover exploded") });
    assert_rejected!(settle_now(&recovered), "recover exploded");

    let finalizer = Future::resolve_with(1).always(|| -> () { panic!("finalizer exploded") });
    assert_rejected!(settle_now(&finalizer), "finalizer exploded");
}

#[test]
fn always_runs_on_both_paths_and_passes_through() {
    let calls = Rc::new(Cell::new(0));
    let a = Rc::clone(&calls);
    let b = Rc::clone(&calls);

    let ok = Future::resolve_with(5).always(move || a.set(a.get() + 1));
    let err = Future::reject_with("E").always(move || b.set(b.get() + 1));
    assert_fulfilled!(settle_now(&ok), 5);
    assert_rejected!(settle_now(&err), "E");
    assert_eq!(calls.get(), 2);
}

#[test]
fn always_error_replaces_rejection() {
    let future = Future::reject_with("original").always(|| Err::<(), _>("cleanup"));
    assert_rejected!(settle_now(&future), "cleanup");
}

#[test]
fn returned_futures_are_flattened() {
    init_test("returned_futures_are_flattened");
    let (inner, complete_inner, _) = deferred();
    let outer = Future::resolve_with(1).then(move |_| inner);
    run_microtasks();
    assert!(outer.is_pending(), "outer must wait for the adopted future");

    complete_inner.call("inner value");
    assert_fulfilled!(settle_now(&outer), "inner value");

    let nested = Future::resolve_with(Future::resolve_with(Future::resolve_with(3)));
    assert_fulfilled!(settle_now(&nested), 3);

    let rejected = Future::resolve_with(1).then(|_| Future::reject_with("inner failure"));
    assert_rejected!(settle_now(&rejected), "inner failure");
}

#[test]
fn rejection_reasons_are_not_flattened() {
    let inner = Future::resolve_with(1);
    let outcome = settle_now(&Future::reject_with(inner.clone()));
    assert_eq!(outcome.status, State::Rejected);
    assert!(outcome.value.is_thenable());
    assert_eq!(outcome.value, Value::from(inner));
}

/// A thenable that is not a `Future`: settles synchronously on subscribe and
/// then tries to settle again.
#[derive(Debug)]
struct Eager {
    value: Value,
    subscriptions: Rc<Cell<usize>>,
}

impl Thenable for Eager {
    fn subscribe(&self, on_fulfilled: settle::future::Settler, on_rejected: settle::future::Settler) {
        self.subscriptions.set(self.subscriptions.get() + 1);
        on_fulfilled(self.value.clone());
        on_rejected(Value::from("ignored"));
    }
}

#[test]
fn foreign_thenables_are_adopted_once() {
    let subscriptions = Rc::new(Cell::new(0));
    let eager = Rc::new(Eager {
        value: Value::from("foreign"),
        subscriptions: Rc::clone(&subscriptions),
    });
    let adopted = Future::from_thenable(eager);
    assert_fulfilled!(settle_now(&adopted), "foreign");
    assert_eq!(subscriptions.get(), 1);
}

/// A thenable that never calls back.
struct Silent;

impl fmt::Debug for Silent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Silent")
    }
}

impl Thenable for Silent {
    fn subscribe(&self, _: settle::future::Settler, _: settle::future::Settler) {}
}

#[test]
fn adopting_a_silent_thenable_stays_pending() {
    let future = Future::resolve_with(Value::Thenable(Rc::new(Silent)));
    run_microtasks();
    assert!(future.is_pending());
}

/// A thenable whose `subscribe` panics, optionally after fulfilling.
#[derive(Debug)]
struct Exploding {
    fulfill_first: bool,
}

impl Thenable for Exploding {
    fn subscribe(&self, on_fulfilled: settle::future::Settler, _: settle::future::Settler) {
        if self.fulfill_first {
            on_fulfilled(Value::from("before the fault"));
        }
        panic!("subscribe exploded");
    }
}

#[test]
fn panicking_subscribe_rejects_the_adopting_future() {
    init_test("panicking_subscribe_rejects_the_adopting_future");
    let adopted = Future::resolve_with(Value::Thenable(Rc::new(Exploding {
        fulfill_first: false,
    })));
    let drained = std::panic::catch_unwind(run_microtasks);
    assert!(drained.is_ok(), "fault must not escape the drain");
    assert_rejected!(settle_now(&adopted), "subscribe exploded");

    let child = Future::resolve_with(1).then(|_| {
        Value::Thenable(Rc::new(Exploding {
            fulfill_first: false,
        }))
    });
    assert_rejected!(settle_now(&child), "subscribe exploded");
    settle::test_complete!("panicking_subscribe_rejects_the_adopting_future");
}

#[test]
fn settlement_before_a_subscribe_fault_stands() {
    let adopted = Future::from_thenable(Rc::new(Exploding {
        fulfill_first: true,
    }));
    assert_fulfilled!(settle_now(&adopted), "before the fault");
}

#[test]
fn settled_state_is_observable() {
    let (future, complete, _) = deferred();
    assert_eq!(future.state(), State::Pending);
    assert_eq!(future.value(), None);

    complete.call(vec![Value::from(1), Value::from("two")]);
    run_microtasks();
    assert_eq!(future.state(), State::Fulfilled);
    assert_eq!(
        future.outcome(),
        Some(Outcome::fulfilled(Value::list([Value::from(1), Value::from("two")])))
    );
    assert_eq!(
        future.outcome().map(Outcome::into_result),
        Some(Ok(Value::list([Value::from(1), Value::from("two")])))
    );
}

#[test]
fn reactions_registered_during_delivery_still_run() {
    let log = Log::new();
    let future = Future::resolve_with(1);
    let inner_log = log.clone();
    let handle = future.clone();
    future.then(move |_| {
        inner_log.push("outer");
        let log = inner_log.clone();
        handle.then(move |_| log.push("inner"));
    });
    run_microtasks();
    assert_eq!(log.snapshot(), vec!["outer", "inner"]);
}

#[test]
fn dropped_handles_do_not_stop_delivery() {
    let seen = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&seen);
    {
        let future = Future::resolve_with("kept alive by the queue");
        future.then(move |v| *sink.borrow_mut() = Some(v));
    }
    run_microtasks();
    assert_eq!(*seen.borrow(), Some(Value::from("kept alive by the queue")));
}
