//! Runtime context
//!
//! A [`Runtime`] bundles the scheduler and resolution limits shared by every
//! future created through it. Futures derived with `then` inherit the runtime
//! of their source.

use crate::async_runtime::{deferred, Deferred, EventLoop, Future, Job, Scheduler};
use crate::error::RuntimeError;
use crate::value::Value;
use pledge_config::RuntimeConfig;
use std::fmt;
use std::rc::Rc;
use tracing::trace;

struct RuntimeInner {
    scheduler: Rc<dyn Scheduler>,
    max_chain_depth: Option<usize>,
}

/// Cheap-to-clone handle to a scheduler plus resolution limits
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    /// Create a runtime with no resolution limit
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                scheduler,
                max_chain_depth: None,
            }),
        }
    }

    /// Create a runtime whose limits come from configuration
    pub fn with_config(scheduler: Rc<dyn Scheduler>, config: &RuntimeConfig) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                scheduler,
                max_chain_depth: config.max_chain_depth(),
            }),
        }
    }

    /// Create a runtime driven by a fresh [`EventLoop`] built from configuration
    pub fn with_event_loop(config: &RuntimeConfig) -> (Self, Rc<EventLoop>) {
        let event_loop = EventLoop::from_config(config);
        let runtime = Self::with_config(event_loop.clone(), config);
        (runtime, event_loop)
    }

    /// Resolution step limit per future, if any
    pub fn max_chain_depth(&self) -> Option<usize> {
        self.inner.max_chain_depth
    }

    /// Hand a job to the scheduler
    pub fn schedule(&self, job: Job) {
        trace!("scheduling job");
        self.inner.scheduler.schedule(job);
    }

    /// Construct a future from an initializer value (see [`Future::new`])
    pub fn future(&self, initializer: &Value) -> Result<Future, RuntimeError> {
        Future::new(self, initializer)
    }

    /// An already-fulfilled future
    pub fn resolved(&self, value: impl Into<Value>) -> Future {
        Future::resolved(self, value)
    }

    /// An already-rejected future
    pub fn rejected(&self, reason: impl Into<Value>) -> Future {
        Future::rejected(self, reason)
    }

    /// A pending future with its capabilities exposed
    pub fn deferred(&self) -> Deferred {
        deferred(self)
    }

    /// Whether two handles share the same runtime
    pub fn ptr_eq(&self, other: &Runtime) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("max_chain_depth", &self.inner.max_chain_depth)
            .finish_non_exhaustive()
    }
}
