//! Async runtime infrastructure for pledge
//!
//! This module provides the deferred-value machinery:
//! - Future type and its settlement state machine
//! - Settlement resolution procedure (future and thenable adoption)
//! - Scheduling port with an in-process event loop and a tokio-backed driver
//! - Combinators (`all`, `race`)
//!
//! Reactions never run inline. Every reaction is handed to a [`Scheduler`],
//! which runs it in a later turn, in FIFO order.

pub mod combinators;
pub mod event_loop;
pub mod future;
pub(crate) mod resolve;
pub mod tokio_driver;

pub use combinators::{all, race};
pub use event_loop::EventLoop;
pub use future::{deferred, Deferred, Future, StateKind};
pub use tokio_driver::{tokio_scheduler, TokioDriver, TokioScheduler};

/// A unit of deferred work
pub type Job = Box<dyn FnOnce()>;

/// Scheduling port
///
/// Implementations must run every job strictly after the call to `schedule`
/// has returned, in the order jobs were scheduled, and must never drop a job
/// while they are still being driven.
pub trait Scheduler {
    fn schedule(&self, job: Job);
}
