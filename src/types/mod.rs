//! Core types.
//!
//! - [`id`]: identifiers (`FutureId`, `TimerId`) and virtual [`Time`]
//! - [`outcome`]: lifecycle [`State`] and settled [`Outcome`] records
//! - [`value`]: the dynamic [`Value`] payload

pub mod id;
pub mod outcome;
pub mod value;

pub use id::{FutureId, Time, TimerId};
pub use outcome::{Outcome, State};
pub use value::Value;
