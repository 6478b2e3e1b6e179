//! Property tests for settlement, ordering and combinator results under
//! arbitrary settlement schedules.

mod common;

use common::{Log, deferred, init_test_logging, settle_now, test_lab, test_proptest_config};
use proptest::prelude::*;
use settle::{Future, Outcome, State, Value};
use std::time::Duration;

// ============================================================================
// Arbitrary Generators
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Settle {
    Complete(i64),
    Fail(i64),
}

fn arb_settle() -> impl Strategy<Value = Settle> {
    prop_oneof![
        any::<i64>().prop_map(Settle::Complete),
        any::<i64>().prop_map(Settle::Fail),
    ]
}

/// A timer-driven input: settles after `delay_ms` with `Ok(n)` or `Err(n)`.
fn arb_timed() -> impl Strategy<Value = (u64, Result<i64, i64>)> {
    (
        0u64..50,
        prop_oneof![any::<i64>().prop_map(Ok), any::<i64>().prop_map(Err)],
    )
}

fn spawn(lab: &settle::LabRuntime, (delay, result): (u64, Result<i64, i64>)) -> Future {
    let after = Duration::from_millis(delay);
    match result {
        Ok(n) => lab.delay(after, n),
        Err(n) => lab.delay_reject(after, n),
    }
}

/// Index of the input that settles first: earliest deadline, then input order.
fn first_index<T>(inputs: &[(u64, T)], keep: impl Fn(&T) -> bool) -> Option<usize> {
    inputs
        .iter()
        .enumerate()
        .filter(|(_, (_, r))| keep(r))
        .min_by_key(|(i, (delay, _))| (*delay, *i))
        .map(|(i, _)| i)
}

// ============================================================================
// Settlement
// ============================================================================

proptest! {
    #![proptest_config(test_proptest_config(128))]

    /// Whatever capability call comes first determines the outcome.
    #[test]
    fn first_capability_call_wins(calls in prop::collection::vec(arb_settle(), 1..8)) {
        init_test_logging();
        let (future, complete, fail) = deferred();
        for call in &calls {
            match *call {
                Settle::Complete(n) => complete.call(n),
                Settle::Fail(n) => fail.call(n),
            }
        }
        let expected = match calls[0] {
            Settle::Complete(n) => Outcome::fulfilled(n),
            Settle::Fail(n) => Outcome::rejected(n),
        };
        prop_assert_eq!(settle_now(&future), expected);
    }

    /// Reactions of one kind run in registration order, whatever the outcome.
    #[test]
    fn reactions_keep_registration_order(count in 1usize..32, reject in any::<bool>()) {
        let (future, complete, fail) = deferred();
        let log = Log::new();
        for n in 0..count {
            let on_ok = log.clone();
            let on_err = log.clone();
            future.then_or(move |_| on_ok.push(n), move |_| on_err.push(n));
        }
        if reject {
            fail.call(());
        } else {
            complete.call(());
        }
        prop_assert!(future.is_pending());
        let _ = settle_now(&future);
        prop_assert_eq!(log.snapshot(), (0..count).collect::<Vec<_>>());
    }

    /// A chain of `n` increments fulfills with `n`.
    #[test]
    fn chains_compose(depth in 0usize..64) {
        let chain = (0..depth).fold(Future::resolve_with(0), |future, _| {
            future.then(|v| v.as_int().unwrap_or(0) + 1)
        });
        prop_assert_eq!(settle_now(&chain), Outcome::fulfilled(depth as i64));
    }
}

// ============================================================================
// Combinators under virtual time
// ============================================================================

proptest! {
    #![proptest_config(test_proptest_config(64))]

    /// `all_of` fulfills with every value in input order or rejects with the
    /// earliest rejection.
    #[test]
    fn all_of_matches_model(inputs in prop::collection::vec(arb_timed(), 0..8)) {
        init_test_logging();
        let mut lab = test_lab();
        let futures: Vec<Future> = inputs.iter().map(|input| spawn(&lab, *input)).collect();
        let outcome = lab.run_until_settled(&Future::all_of(futures)).unwrap();

        let expected = match first_index(&inputs, Result::is_err) {
            Some(i) => Outcome::rejected(inputs[i].1.unwrap_err()),
            None => Outcome::fulfilled(Value::list(
                inputs.iter().map(|(_, r)| r.unwrap_or_default()),
            )),
        };
        prop_assert_eq!(outcome, expected);
    }

    /// `all_settled` reports every input, index-aligned.
    #[test]
    fn all_settled_matches_model(inputs in prop::collection::vec(arb_timed(), 0..8)) {
        let mut lab = test_lab();
        let futures: Vec<Future> = inputs.iter().map(|input| spawn(&lab, *input)).collect();
        let outcome = lab.run_until_settled(&Future::all_settled(futures)).unwrap();

        let expected = Value::list(inputs.iter().map(|(_, r)| match r {
            Ok(n) => Outcome::fulfilled(*n).to_value(),
            Err(n) => Outcome::rejected(*n).to_value(),
        }));
        prop_assert_eq!(outcome, Outcome::fulfilled(expected));
    }

    /// `race_of` adopts the first input to settle.
    #[test]
    fn race_of_matches_model(inputs in prop::collection::vec(arb_timed(), 1..8)) {
        let mut lab = test_lab();
        let futures: Vec<Future> = inputs.iter().map(|input| spawn(&lab, *input)).collect();
        let outcome = lab.run_until_settled(&Future::race_of(futures)).unwrap();

        let winner = first_index(&inputs, |_| true).unwrap();
        let expected = match inputs[winner].1 {
            Ok(n) => Outcome::fulfilled(n),
            Err(n) => Outcome::rejected(n),
        };
        prop_assert_eq!(outcome, expected);
    }

    /// `any_of` adopts the first fulfillment, or aggregates every reason.
    #[test]
    fn any_of_matches_model(inputs in prop::collection::vec(arb_timed(), 1..8)) {
        let mut lab = test_lab();
        let futures: Vec<Future> = inputs.iter().map(|input| spawn(&lab, *input)).collect();
        let outcome = lab.run_until_settled(&Future::any_of(futures)).unwrap();

        match first_index(&inputs, Result::is_ok) {
            Some(i) => {
                prop_assert_eq!(outcome, Outcome::fulfilled(inputs[i].1.unwrap_or_default()));
            }
            None => {
                prop_assert_eq!(outcome.status, State::Rejected);
                let reasons: Vec<Value> = inputs
                    .iter()
                    .map(|(_, r)| Value::from(r.unwrap_err()))
                    .collect();
                let aggregate = outcome.value.as_aggregate().cloned().unwrap();
                prop_assert_eq!(aggregate.errors(), reasons.as_slice());
            }
        }
    }
}
