//! Pledge runtime: a deferred-value primitive
//!
//! A [`Future`] starts pending, settles exactly once, and notifies any number
//! of observers registered with [`Future::then`]. Reactions always run in a
//! later scheduler turn, in registration order. Values returned by reactions
//! go through the settlement resolution procedure, which flattens nested
//! futures and adopts foreign thenables.
//!
//! # Example
//!
//! ```
//! use pledge_runtime::{EventLoop, Runtime, Value};
//!
//! let event_loop = EventLoop::new();
//! let runtime = Runtime::new(event_loop.clone());
//!
//! let answer = runtime.resolved(42).then(
//!     &Value::function(|_, args| match &args[0] {
//!         Value::Number(n) => Ok(Value::Number(n + 1.0)),
//!         other => Ok(other.clone()),
//!     }),
//!     &Value::Undefined,
//! );
//! assert!(answer.is_pending());
//!
//! event_loop.run_until_idle().unwrap();
//! assert!(answer.is_fulfilled());
//! ```

pub mod async_runtime;
pub mod error;
pub mod runtime;
pub mod value;

pub use async_runtime::{
    all, deferred, race, tokio_scheduler, Deferred, EventLoop, Future, Job, Scheduler, StateKind,
    TokioDriver, TokioScheduler,
};
pub use error::RuntimeError;
pub use pledge_config::RuntimeConfig;
pub use runtime::Runtime;
pub use value::{arg, ErrorKind, ErrorValue, NativeFn, ObjectRef, Property, Value};
