//! Join combinators: wait for every input.
//!
//! [`all_of`] short-circuits on the first rejection; [`all_settled`] never
//! rejects and reports each input's outcome as a `{status, value}` record.

use crate::future::{Future, Thenable};
use crate::types::{Outcome, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Index-aligned result slots plus a countdown of inputs still outstanding.
struct Slots {
    values: RefCell<Vec<Value>>,
    remaining: Cell<usize>,
}

impl Slots {
    fn new(len: usize) -> Rc<Self> {
        Rc::new(Self {
            values: RefCell::new(vec![Value::Undefined; len]),
            remaining: Cell::new(len),
        })
    }

    /// Stores `value` at `index`. Returns the full list once every slot is
    /// filled.
    fn fill(&self, index: usize, value: Value) -> Option<Value> {
        match self.values.borrow_mut().get_mut(index) {
            Some(slot) => *slot = value,
            None => return None,
        }
        let remaining = self.remaining.get().saturating_sub(1);
        self.remaining.set(remaining);
        (remaining == 0).then(|| Value::from(self.values.take()))
    }
}

/// Fulfills with the index-aligned list of values once every input has
/// fulfilled; fails with the reason of the first input to reject.
///
/// An empty input fulfills with an empty list.
pub fn all_of(futures: impl IntoIterator<Item = Future>) -> Future {
    let futures: Vec<Future> = futures.into_iter().collect();
    Future::new(move |complete, fail| {
        if futures.is_empty() {
            complete.call(Vec::<Value>::new());
            return;
        }
        let slots = Slots::new(futures.len());
        for (index, future) in futures.iter().enumerate() {
            let slots = Rc::clone(&slots);
            let complete = complete.clone();
            let fail = fail.clone();
            future.subscribe(
                Box::new(move |value| {
                    if let Some(values) = slots.fill(index, value) {
                        complete.call(values);
                    }
                }),
                Box::new(move |reason| fail.call(reason)),
            );
        }
    })
}

/// Fulfills, once every input has settled, with index-aligned records
/// `{status: "fulfilled" | "rejected", value}`. Never rejects.
///
/// An empty input fulfills with an empty list.
pub fn all_settled(futures: impl IntoIterator<Item = Future>) -> Future {
    let futures: Vec<Future> = futures.into_iter().collect();
    Future::new(move |complete, _| {
        if futures.is_empty() {
            complete.call(Vec::<Value>::new());
            return;
        }
        let slots = Slots::new(futures.len());
        for (index, future) in futures.iter().enumerate() {
            let (on_fulfilled, on_rejected) = (Rc::clone(&slots), Rc::clone(&slots));
            let (complete_fulfilled, complete_rejected) = (complete.clone(), complete.clone());
            future.subscribe(
                Box::new(move |value| {
                    let record = Outcome::fulfilled(value).to_value();
                    if let Some(records) = on_fulfilled.fill(index, record) {
                        complete_fulfilled.call(records);
                    }
                }),
                Box::new(move |reason| {
                    let record = Outcome::rejected(reason).to_value();
                    if let Some(records) = on_rejected.fill(index, record) {
                        complete_rejected.call(records);
                    }
                }),
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::run_microtasks;
    use crate::test_utils::settle_now;
    use crate::types::State;

    fn deferred() -> (Future, crate::future::Complete, crate::future::Fail) {
        let slot = Rc::new(RefCell::new(None));
        let keep = Rc::clone(&slot);
        let future = Future::new(move |complete, fail| *keep.borrow_mut() = Some((complete, fail)));
        let (complete, fail) = slot.borrow_mut().take().unwrap();
        (future, complete, fail)
    }

    #[test]
    fn all_of_keeps_input_order() {
        crate::test_utils::init_test_logging();
        crate::test_phase!("all_of_keeps_input_order");
        let (slow, complete_slow, _) = deferred();
        let all = all_of([slow, Future::resolve_with(2), Future::resolve_with(3)]);
        run_microtasks();
        assert!(all.is_pending());

        complete_slow.call(1);
        assert_eq!(
            settle_now(&all),
            Outcome::fulfilled(Value::list([1, 2, 3]))
        );
        crate::test_complete!("all_of_keeps_input_order");
    }

    #[test]
    fn all_of_fails_with_first_rejection() {
        let (pending, _, _) = deferred();
        let all = all_of([pending, Future::reject_with("E"), Future::reject_with("F")]);
        assert_eq!(settle_now(&all), Outcome::rejected("E"));
    }

    #[test]
    fn all_of_empty_fulfills_with_empty_list() {
        let all = all_of(Vec::new());
        assert_eq!(settle_now(&all), Outcome::fulfilled(Vec::<Value>::new()));
    }

    #[test]
    fn all_settled_reports_each_outcome() {
        let settled = all_settled([Future::resolve_with(1), Future::reject_with("E")]);
        let outcome = settle_now(&settled);
        assert_eq!(outcome.status, State::Fulfilled);

        let records = outcome.value.as_list().unwrap().to_vec();
        assert_eq!(records[0].get("status"), Some(&Value::from("fulfilled")));
        assert_eq!(records[0].get("value"), Some(&Value::Int(1)));
        assert_eq!(records[1].get("status"), Some(&Value::from("rejected")));
        assert_eq!(records[1].get("value"), Some(&Value::from("E")));
    }

    #[test]
    fn all_settled_empty_fulfills_with_empty_list() {
        let settled = all_settled(Vec::new());
        assert_eq!(settle_now(&settled), Outcome::fulfilled(Vec::<Value>::new()));
    }
}
