//! Settlement resolution procedure
//!
//! Decides how the value returned by a reaction settles the derived future:
//! adopt another pledge future, adopt a foreign thenable, or fulfill with a
//! plain value. Returning the derived future itself is a chaining cycle.
//!
//! Foreign thenables may call the capabilities we hand them any number of
//! times, synchronously or later; a per-step latch lets only the first call
//! through. A thenable that resolves synchronously with another thenable does
//! not recurse: the nested candidate is queued on a trampoline and picked up
//! by the loop already running.

use crate::async_runtime::Future;
use crate::error::RuntimeError;
use crate::value::{arg, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Candidate classification
enum Candidate {
    /// The future being settled
    SameFuture,
    /// Another pledge future
    OurFuture(Future),
    /// Object or function: may expose a `then` member
    Thenable(Value),
    /// Anything else
    Plain(Value),
}

fn classify(target: &Future, candidate: Value) -> Candidate {
    match candidate {
        Value::Future(ref future) if future.ptr_eq(target) => Candidate::SameFuture,
        Value::Future(future) => Candidate::OurFuture(future),
        Value::Object(_) | Value::Function(..) => Candidate::Thenable(candidate),
        plain => Candidate::Plain(plain),
    }
}

#[derive(Default)]
struct Trampoline {
    running: bool,
    queued: Option<Value>,
    steps: usize,
}

/// One resolution of one target future, possibly spanning many candidates
struct Resolution {
    target: Future,
    limit: Option<usize>,
    trampoline: RefCell<Trampoline>,
}

/// Settle `target` according to `candidate`
pub(crate) fn resolve_future(target: &Future, candidate: Value) {
    let resolution = Rc::new(Resolution {
        target: target.clone(),
        limit: target.runtime().max_chain_depth(),
        trampoline: RefCell::new(Trampoline::default()),
    });
    resolution.resolve(candidate);
}

impl Resolution {
    fn resolve(self: &Rc<Self>, candidate: Value) {
        {
            let mut trampoline = self.trampoline.borrow_mut();
            if trampoline.running {
                trampoline.queued = Some(candidate);
                return;
            }
            trampoline.running = true;
        }

        let mut next = Some(candidate);
        while let Some(candidate) = next.take() {
            self.step(candidate);
            next = self.trampoline.borrow_mut().queued.take();
        }
        self.trampoline.borrow_mut().running = false;
    }

    fn step(self: &Rc<Self>, candidate: Value) {
        if let Some(limit) = self.limit {
            let steps = {
                let mut trampoline = self.trampoline.borrow_mut();
                trampoline.steps += 1;
                trampoline.steps
            };
            if steps > limit {
                warn!(future = self.target.id(), limit, "resolution depth limit exceeded");
                self.target
                    .settle_rejected(RuntimeError::ChainDepthExceeded { limit }.into_reason());
                return;
            }
        }

        match classify(&self.target, candidate) {
            Candidate::SameFuture => {
                debug!(future = self.target.id(), "chaining cycle detected");
                let fault = RuntimeError::ChainCycle {
                    future: self.target.id(),
                };
                self.target.settle_rejected(fault.into_reason());
            }
            Candidate::OurFuture(future) => {
                debug!(future = self.target.id(), adopting = future.id(), "adopting future");
                self.adopt_future(&future);
            }
            Candidate::Thenable(candidate) => self.adopt_thenable(candidate),
            Candidate::Plain(value) => self.target.settle_fulfilled(value),
        }
    }

    /// Follow another pledge future. Its outcome arrives through `then`, so
    /// each level of nesting costs one scheduler turn and no stack.
    fn adopt_future(self: &Rc<Self>, future: &Future) {
        let resolution = Rc::clone(self);
        let on_value = Value::function(move |_, args| {
            resolution.resolve(arg(args, 0));
            Ok(Value::Undefined)
        });
        let target = self.target.clone();
        let on_reason = Value::function(move |_, args| {
            target.settle_rejected(arg(args, 0));
            Ok(Value::Undefined)
        });
        future.then(&on_value, &on_reason);
    }

    fn adopt_thenable(self: &Rc<Self>, candidate: Value) {
        let latch = Rc::new(Cell::new(false));

        let then = match candidate.get_member("then") {
            Ok(then) => then,
            Err(fault) => {
                if !latch.replace(true) {
                    self.target.settle_rejected(fault.into_reason());
                }
                return;
            }
        };

        if !then.is_callable() {
            if !latch.replace(true) {
                self.target.settle_fulfilled(candidate);
            }
            return;
        }

        trace!(future = self.target.id(), "calling foreign then");
        let on_inner = {
            let resolution = Rc::clone(self);
            let latch = latch.clone();
            Value::function(move |_, args| {
                if latch.replace(true) {
                    debug!(future = resolution.target.id(), "ignoring repeated thenable resolution");
                } else {
                    resolution.resolve(arg(args, 0));
                }
                Ok(Value::Undefined)
            })
        };
        let on_inner_fail = {
            let target = self.target.clone();
            let latch = latch.clone();
            Value::function(move |_, args| {
                if latch.replace(true) {
                    debug!(future = target.id(), "ignoring repeated thenable rejection");
                } else {
                    target.settle_rejected(arg(args, 0));
                }
                Ok(Value::Undefined)
            })
        };

        if let Err(fault) = then.call(&candidate, &[on_inner, on_inner_fail]) {
            if latch.replace(true) {
                debug!(future = self.target.id(), "ignoring fault from settled thenable");
            } else {
                self.target.settle_rejected(fault.into_reason());
            }
        }
    }
}
