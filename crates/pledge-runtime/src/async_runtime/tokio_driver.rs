//! Tokio-backed scheduler
//!
//! Jobs travel over a tokio unbounded channel and are executed by a
//! [`TokioDriver`] polled from a current-thread runtime (or a `LocalSet`).
//! The channel preserves FIFO order and the driver yields to tokio between
//! turns, so other local tasks interleave with reactions.

use crate::async_runtime::{Job, Scheduler};
use std::rc::Rc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{trace, warn};

/// Sending half: implements [`Scheduler`]
pub struct TokioScheduler {
    sender: UnboundedSender<Job>,
}

/// Receiving half: runs scheduled jobs
pub struct TokioDriver {
    receiver: UnboundedReceiver<Job>,
}

/// Create a connected scheduler/driver pair
pub fn tokio_scheduler() -> (Rc<TokioScheduler>, TokioDriver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        Rc::new(TokioScheduler { sender }),
        TokioDriver { receiver },
    )
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, job: Job) {
        if self.sender.send(job).is_err() {
            warn!("tokio driver dropped; discarding scheduled job");
        }
    }
}

impl TokioDriver {
    /// Wait for the next job and run it
    ///
    /// Returns `false` once every scheduler handle has been dropped and the
    /// queue is drained.
    pub async fn turn(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Run queued jobs until none are left, yielding between turns
    ///
    /// Returns the number of turns executed.
    pub async fn run_until_idle(&mut self) -> u64 {
        let mut turns = 0u64;
        while let Ok(job) = self.receiver.try_recv() {
            job();
            turns += 1;
            tokio::task::yield_now().await;
        }
        trace!(turns, "tokio driver idle");
        turns
    }
}
