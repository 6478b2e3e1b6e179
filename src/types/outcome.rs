//! Lifecycle state and settled outcomes.
//!
//! A future starts [`State::Pending`] and moves exactly once to
//! [`State::Fulfilled`] or [`State::Rejected`]. An [`Outcome`] pairs a
//! terminal state with its payload; `all_settled` reports one per input.

use super::Value;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a future.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// Not yet settled.
    #[default]
    Pending,
    /// Settled with a success value.
    Fulfilled,
    /// Settled with a failure reason.
    Rejected,
}

impl State {
    /// Returns the lowercase state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fulfilled => "fulfilled",
            Self::Rejected => "rejected",
        }
    }

    /// Returns true once the state is terminal.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns true if this is the pending state.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns true if this is the fulfilled state.
    #[must_use]
    pub const fn is_fulfilled(self) -> bool {
        matches!(self, Self::Fulfilled)
    }

    /// Returns true if this is the rejected state.
    #[must_use]
    pub const fn is_rejected(self) -> bool {
        matches!(self, Self::Rejected)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The terminal result of a future: its status and payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Either [`State::Fulfilled`] or [`State::Rejected`].
    pub status: State,
    /// The success value or failure reason.
    pub value: Value,
}

impl Outcome {
    /// A fulfilled outcome.
    #[must_use]
    pub fn fulfilled(value: impl Into<Value>) -> Self {
        Self {
            status: State::Fulfilled,
            value: value.into(),
        }
    }

    /// A rejected outcome.
    #[must_use]
    pub fn rejected(reason: impl Into<Value>) -> Self {
        Self {
            status: State::Rejected,
            value: reason.into(),
        }
    }

    /// Returns true if the outcome is a fulfillment.
    #[must_use]
    pub fn is_fulfilled(&self) -> bool {
        self.status.is_fulfilled()
    }

    /// Returns true if the outcome is a rejection.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.status.is_rejected()
    }

    /// Converts into `Ok(value)` / `Err(reason)`.
    pub fn into_result(self) -> Result<Value, Value> {
        if self.status.is_fulfilled() {
            Ok(self.value)
        } else {
            Err(self.value)
        }
    }

    /// Renders the outcome as a `{status, value}` record value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::record([
            ("status", Value::from(self.status.as_str())),
            ("value", self.value.clone()),
        ])
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.status, self.value)
    }
}
