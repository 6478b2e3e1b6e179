//! First-success combinator.
//!
//! [`any_of`] fulfills with the first input to fulfill. Only when every input
//! has rejected does it fail, with an [`AggregateError`] whose reasons are
//! index-aligned with the inputs.

use crate::error::AggregateError;
use crate::future::{Future, Thenable};
use crate::types::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Fulfills with the first fulfillment; fails with an aggregate of every
/// rejection reason if no input fulfills.
///
/// An empty input fails immediately with an empty aggregate.
pub fn any_of(futures: impl IntoIterator<Item = Future>) -> Future {
    let futures: Vec<Future> = futures.into_iter().collect();
    if futures.is_empty() {
        return Future::reject_with(AggregateError::all_rejected(Vec::new()));
    }

    Future::new(move |complete, fail| {
        let reasons = Rc::new(RefCell::new(vec![Value::Undefined; futures.len()]));
        let remaining = Rc::new(Cell::new(futures.len()));
        for (index, future) in futures.iter().enumerate() {
            let complete = complete.clone();
            let fail = fail.clone();
            let reasons = Rc::clone(&reasons);
            let remaining = Rc::clone(&remaining);
            future.subscribe(
                Box::new(move |value| complete.call(value)),
                Box::new(move |reason| {
                    if let Some(slot) = reasons.borrow_mut().get_mut(index) {
                        *slot = reason;
                    }
                    remaining.set(remaining.get().saturating_sub(1));
                    if remaining.get() == 0 {
                        fail.call(AggregateError::all_rejected(reasons.take()));
                    }
                }),
            );
        }
    })
}
