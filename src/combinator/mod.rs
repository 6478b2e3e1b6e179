//! Combinators over collections of futures.
//!
//! - [`all_of`]: fulfill with every value, or fail with the first rejection
//! - [`all_settled`]: wait for every input and report each outcome
//! - [`race_of`]: settle the way the first input to settle does
//! - [`any_of`]: fulfill with the first value, or fail with every reason
//!
//! Each combinator returns a fresh [`Future`](crate::Future) and keeps no
//! state beyond the reactions it registers on its inputs. Results are
//! index-aligned with the input order, not with settlement order.
//!
//! Inputs are observed through [`Thenable::subscribe`](crate::Thenable), so no
//! child future is allocated per input.

pub mod first_ok;
pub mod join;
pub mod race;

pub use first_ok::any_of;
pub use join::{all_of, all_settled};
pub use race::race_of;
