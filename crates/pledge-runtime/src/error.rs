//! Runtime error type
//!
//! Faults raised by callbacks and by the runtime itself. Apart from
//! [`RuntimeError::TypeConfig`] and [`RuntimeError::TurnBudgetExhausted`],
//! faults never reach the caller directly: they are converted into rejection
//! reasons with [`RuntimeError::into_reason`].

use crate::value::{ErrorKind, ErrorValue, Value};
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum RuntimeError {
    /// Future constructor received a non-callable initializer
    #[error("TypeConfigError: {msg}")]
    TypeConfig { msg: String },
    /// A non-callable value was invoked
    #[error("TypeError: {msg}")]
    TypeError { msg: String },
    /// A reaction returned the future it settles
    #[error("ChainCycleError: chaining cycle detected for future #{future}")]
    ChainCycle { future: u64 },
    /// Resolution of one future took more steps than allowed
    #[error("ChainDepthError: resolution exceeded {limit} steps")]
    ChainDepthExceeded { limit: usize },
    /// A fault carrying an arbitrary value
    #[error("Uncaught {0}")]
    Thrown(Value),
    /// Event loop stopped with work left in the queue
    #[error("turn budget of {budget} exhausted with {pending} jobs still queued")]
    TurnBudgetExhausted { budget: u64, pending: usize },
}

impl RuntimeError {
    /// Raise an arbitrary value as a fault
    pub fn throw(value: impl Into<Value>) -> Self {
        RuntimeError::Thrown(value.into())
    }

    /// Convert the fault into the reason a future is rejected with
    ///
    /// A thrown value is passed through unchanged; runtime faults become
    /// [`Value::Error`] values of the matching kind.
    pub fn into_reason(self) -> Value {
        let error = match self {
            RuntimeError::Thrown(value) => return value,
            RuntimeError::TypeConfig { msg } | RuntimeError::TypeError { msg } => {
                ErrorValue::new(ErrorKind::TypeError, msg)
            }
            RuntimeError::ChainCycle { future } => ErrorValue::new(
                ErrorKind::ChainCycle,
                format!("chaining cycle detected for future #{}", future),
            ),
            RuntimeError::ChainDepthExceeded { limit } => ErrorValue::new(
                ErrorKind::ChainDepthExceeded,
                format!("resolution exceeded {} steps", limit),
            ),
            RuntimeError::TurnBudgetExhausted { budget, pending } => ErrorValue::new(
                ErrorKind::TurnBudget,
                format!("turn budget of {} exhausted with {} jobs still queued", budget, pending),
            ),
        };
        Value::Error(error)
    }
}
