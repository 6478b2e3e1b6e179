#![allow(dead_code)]
#![allow(unused_imports)]
//! Shared integration test utilities.
//!
//! Import with:
//! ```ignore
//! mod common;
//! use common::*;
//! ```

use proptest::prelude::ProptestConfig;
use settle::{Complete, Fail, Future};
use std::cell::RefCell;
use std::rc::Rc;

pub use settle::test_utils::{init_test_logging, settle_now, test_lab, test_lab_with_events};

/// Environment variable overriding the number of proptest cases.
const PROPTEST_CASES_ENV: &str = "SETTLE_PROPTEST_CASES";

/// Proptest configuration with `cases` successful cases, overridable from the
/// environment.
#[must_use]
pub fn test_proptest_config(cases: u32) -> ProptestConfig {
    let cases = std::env::var(PROPTEST_CASES_ENV)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(cases);
    ProptestConfig {
        cases,
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

/// A pending future together with the capabilities that settle it.
pub fn deferred() -> (Future, Complete, Fail) {
    let slot = Rc::new(RefCell::new(None));
    let keep = Rc::clone(&slot);
    let future = Future::new(move |complete, fail| *keep.borrow_mut() = Some((complete, fail)));
    let (complete, fail) = slot
        .borrow_mut()
        .take()
        .expect("initializer runs synchronously");
    (future, complete, fail)
}

/// A shared, append-only log for observing callback order.
#[derive(Debug, Clone)]
pub struct Log<T>(Rc<RefCell<Vec<T>>>);

impl<T: Clone> Log<T> {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(Vec::new())))
    }

    pub fn push(&self, item: T) {
        self.0.borrow_mut().push(item);
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.0.borrow().clone()
    }
}
