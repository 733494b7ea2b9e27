//! Future combinators
//!
//! Both combinators observe their inputs through `then`, so they inherit the
//! asynchronous delivery guarantees of ordinary reactions.

use crate::async_runtime::{deferred, Future};
use crate::runtime::Runtime;
use crate::value::{arg, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Combine multiple futures into one that fulfills when all fulfill
///
/// Fulfills with an array of values in input order. The first rejection
/// rejects the combined future. An empty input fulfills with an empty array.
pub fn all(runtime: &Runtime, futures: Vec<Future>) -> Future {
    if futures.is_empty() {
        return Future::resolved(runtime, Value::array(Vec::new()));
    }

    let combined = deferred(runtime);
    let slots = Rc::new(RefCell::new(vec![Value::Undefined; futures.len()]));
    let remaining = Rc::new(Cell::new(futures.len()));

    for (index, future) in futures.into_iter().enumerate() {
        let on_value = {
            let slots = slots.clone();
            let remaining = remaining.clone();
            let combined = combined.future.clone();
            Value::function(move |_, args| {
                slots.borrow_mut()[index] = arg(args, 0);
                remaining.set(remaining.get() - 1);
                if remaining.get() == 0 {
                    let values = slots.borrow().clone();
                    combined.settle_fulfilled(Value::array(values));
                }
                Ok(Value::Undefined)
            })
        };
        future.then(&on_value, combined.reject());
    }

    combined.future
}

/// Adopt the outcome of whichever future settles first
///
/// An empty input never settles.
pub fn race(runtime: &Runtime, futures: Vec<Future>) -> Future {
    let winner = deferred(runtime);
    for future in &futures {
        future.then(winner.resolve(), winner.reject());
    }
    winner.future
}
