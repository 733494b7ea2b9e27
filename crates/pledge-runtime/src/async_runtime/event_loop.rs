//! In-process event loop
//!
//! A FIFO job queue driven explicitly by the caller. Deterministic, which makes
//! it the scheduler of choice for tests and embedders that own their main loop.

use crate::async_runtime::{Job, Scheduler};
use crate::error::RuntimeError;
use pledge_config::RuntimeConfig;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{trace, warn};

/// FIFO event loop implementing [`Scheduler`]
pub struct EventLoop {
    queue: RefCell<VecDeque<Job>>,
    turn_budget: Option<u64>,
    turns_run: Cell<u64>,
}

impl EventLoop {
    /// Create an unbounded event loop
    pub fn new() -> Rc<Self> {
        Rc::new(Self::with_limits(
            pledge_config::runtime::DEFAULT_QUEUE_CAPACITY,
            None,
        ))
    }

    /// Create an event loop sized and bounded by configuration
    pub fn from_config(config: &RuntimeConfig) -> Rc<Self> {
        Rc::new(Self::with_limits(
            config.queue_capacity(),
            config.turn_budget(),
        ))
    }

    fn with_limits(capacity: usize, turn_budget: Option<u64>) -> Self {
        Self {
            queue: RefCell::new(VecDeque::with_capacity(capacity)),
            turn_budget,
            turns_run: Cell::new(0),
        }
    }

    /// Number of jobs waiting to run
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Total turns executed over the loop's lifetime
    pub fn turns_run(&self) -> u64 {
        self.turns_run.get()
    }

    /// Run the oldest queued job, if any
    ///
    /// Jobs scheduled while it runs are appended and wait for a later turn.
    pub fn run_once(&self) -> bool {
        let job = self.queue.borrow_mut().pop_front();
        match job {
            Some(job) => {
                job();
                self.turns_run.set(self.turns_run.get() + 1);
                true
            }
            None => false,
        }
    }

    /// Run jobs until the queue is empty
    ///
    /// Returns the number of turns executed. With a turn budget configured,
    /// stops with [`RuntimeError::TurnBudgetExhausted`] once the budget is
    /// spent and work remains.
    pub fn run_until_idle(&self) -> Result<u64, RuntimeError> {
        let mut turns = 0u64;
        loop {
            if let Some(budget) = self.turn_budget {
                if turns >= budget && !self.is_idle() {
                    let pending = self.pending();
                    warn!(budget, pending, "event loop turn budget exhausted");
                    return Err(RuntimeError::TurnBudgetExhausted { budget, pending });
                }
            }
            if !self.run_once() {
                break;
            }
            turns += 1;
        }
        trace!(turns, "event loop idle");
        Ok(turns)
    }
}

impl Scheduler for EventLoop {
    fn schedule(&self, job: Job) {
        self.queue.borrow_mut().push_back(job);
    }
}
