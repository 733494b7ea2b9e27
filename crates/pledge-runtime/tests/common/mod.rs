//! Shared test utilities for pledge runtime tests
//!
//! Futures expose their outcome only through `then`, so these helpers
//! register recording reactions and drive the event loop.

#![allow(dead_code)]

use pledge_runtime::{arg, EventLoop, Future, Runtime, RuntimeConfig, RuntimeError, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Observed settlement of a future
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Fulfilled(Value),
    Rejected(Value),
}

/// Runtime wired to a deterministic event loop
pub struct Harness {
    pub runtime: Runtime,
    pub event_loop: Rc<EventLoop>,
}

impl Harness {
    pub fn new() -> Self {
        let event_loop = EventLoop::new();
        Self {
            runtime: Runtime::new(event_loop.clone()),
            event_loop,
        }
    }

    pub fn with_config(config: &RuntimeConfig) -> Self {
        let (runtime, event_loop) = Runtime::with_event_loop(config);
        Self {
            runtime,
            event_loop,
        }
    }

    /// Drain the event loop, returning the number of turns executed
    pub fn run(&self) -> u64 {
        self.event_loop
            .run_until_idle()
            .expect("event loop should go idle")
    }

    /// Observe `future`, drain the loop and return how it settled
    pub fn settle(&self, future: &Future) -> Option<Outcome> {
        let observed = observe(future);
        self.run();
        let outcome = observed.borrow().clone();
        outcome
    }
}

/// Register reactions recording the outcome of `future`
pub fn observe(future: &Future) -> Rc<RefCell<Option<Outcome>>> {
    let slot = Rc::new(RefCell::new(None));
    let on_value = {
        let slot = slot.clone();
        Value::function(move |_, args| {
            *slot.borrow_mut() = Some(Outcome::Fulfilled(arg(args, 0)));
            Ok(Value::Undefined)
        })
    };
    let on_reason = {
        let slot = slot.clone();
        Value::function(move |_, args| {
            *slot.borrow_mut() = Some(Outcome::Rejected(arg(args, 0)));
            Ok(Value::Undefined)
        })
    };
    future.then(&on_value, &on_reason);
    slot
}

/// Single-argument handler
pub fn handler<F>(f: F) -> Value
where
    F: Fn(Value) -> Result<Value, RuntimeError> + 'static,
{
    Value::function(move |_, args| f(arg(args, 0)))
}

/// Handler that appends `label` to `log` and passes its argument through
pub fn logging(log: &Rc<RefCell<Vec<String>>>, label: &str) -> Value {
    let log = log.clone();
    let label = label.to_string();
    handler(move |v| {
        log.borrow_mut().push(format!("{}:{}", label, v));
        Ok(v)
    })
}

pub fn new_log() -> Rc<RefCell<Vec<String>>> {
    Rc::new(RefCell::new(Vec::new()))
}

/// Extract a number or panic
pub fn number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => *n,
        other => panic!("Expected Number, got {:?}", other),
    }
}

pub fn fulfilled(value: impl Into<Value>) -> Option<Outcome> {
    Some(Outcome::Fulfilled(value.into()))
}

pub fn rejected(reason: impl Into<Value>) -> Option<Outcome> {
    Some(Outcome::Rejected(reason.into()))
}
