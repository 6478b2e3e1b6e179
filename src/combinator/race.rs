//! Race combinator: the first input to settle wins.

use crate::future::{Future, Thenable};

/// Settles with the outcome of the first input to settle, in either
/// direction. Later settlements are ignored.
///
/// An empty input never settles.
pub fn race_of(futures: impl IntoIterator<Item = Future>) -> Future {
    let futures: Vec<Future> = futures.into_iter().collect();
    Future::new(move |complete, fail| {
        for future in &futures {
            let complete = complete.clone();
            let fail = fail.clone();
            future.subscribe(
                Box::new(move |value| complete.call(value)),
                Box::new(move |reason| fail.call(reason)),
            );
        }
    })
}
