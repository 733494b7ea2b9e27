//! Future implementation for pledge
//!
//! A Future is a deferred value. It starts pending and settles exactly once:
//! - Pending: no outcome yet
//! - Fulfilled: settled with a value
//! - Rejected: settled with a reason
//!
//! Observers register reactions with `then`/`catch`. Reactions are never run
//! inline: they are handed to the runtime's scheduler and run in a later turn,
//! in registration order.

use crate::async_runtime::resolve;
use crate::error::RuntimeError;
use crate::runtime::Runtime;
use crate::value::{arg, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// Global future ID counter
static FUTURE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Future state; the outcome lives inside the variant, so a fulfilled future
/// can never also carry a reason.
#[derive(Clone)]
enum FutureState {
    Pending,
    Fulfilled(Value),
    Rejected(Value),
}

/// Observable discriminant of a future's state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Pending,
    Fulfilled,
    Rejected,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateKind::Pending => write!(f, "pending"),
            StateKind::Fulfilled => write!(f, "fulfilled"),
            StateKind::Rejected => write!(f, "rejected"),
        }
    }
}

/// A queued reaction: the handler to schedule and the future it settles
struct Reaction {
    handler: Handler,
    derived: Future,
}

struct FutureInner {
    state: FutureState,
    fulfill_reactions: Vec<Reaction>,
    reject_reactions: Vec<Reaction>,
}

impl FutureInner {
    /// Move every future this one keeps alive into `owned`. Only used while dropping.
    fn unlink(&mut self, owned: &mut Vec<Future>) {
        for reaction in self
            .fulfill_reactions
            .drain(..)
            .chain(self.reject_reactions.drain(..))
        {
            owned.push(reaction.derived);
        }
        match std::mem::replace(&mut self.state, FutureState::Pending) {
            FutureState::Fulfilled(Value::Future(future))
            | FutureState::Rejected(Value::Future(future)) => owned.push(future),
            _ => {}
        }
    }
}

// Long `then` chains and nested outcomes would otherwise drop recursively,
// one stack frame group per link. Unlink them into a worklist instead.
impl Drop for FutureInner {
    fn drop(&mut self) {
        let mut owned = Vec::new();
        self.unlink(&mut owned);
        while let Some(future) = owned.pop() {
            let Future { inner, .. } = future;
            if let Ok(cell) = Rc::try_unwrap(inner) {
                cell.into_inner().unlink(&mut owned);
            }
        }
    }
}

/// Reaction handler, with the pass-through defaults used for absent callbacks
enum Handler {
    Callback(Value),
    PassValue,
    PassReason,
}

impl Handler {
    fn on_fulfilled(callback: &Value) -> Self {
        if callback.is_callable() {
            Handler::Callback(callback.clone())
        } else {
            Handler::PassValue
        }
    }

    fn on_rejected(callback: &Value) -> Self {
        if callback.is_callable() {
            Handler::Callback(callback.clone())
        } else {
            Handler::PassReason
        }
    }

    fn invoke(self, argument: Value) -> Result<Value, RuntimeError> {
        match self {
            Handler::Callback(callback) => callback.call(&Value::Undefined, &[argument]),
            Handler::PassValue => Ok(argument),
            Handler::PassReason => Err(RuntimeError::Thrown(argument)),
        }
    }
}

/// Pledge Future - a deferred value with asynchronous observers
///
/// Clones are handles to the same future; equality is identity.
///
/// # State Machine
/// - Pending → Fulfilled (success)
/// - Pending → Rejected (failure)
/// - Once Fulfilled or Rejected, state is final; later settlement calls are no-ops
#[derive(Clone)]
pub struct Future {
    id: u64,
    inner: Rc<RefCell<FutureInner>>,
    runtime: Runtime,
}

impl Future {
    pub(crate) fn pending(runtime: &Runtime) -> Self {
        Self {
            id: FUTURE_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            inner: Rc::new(RefCell::new(FutureInner {
                state: FutureState::Pending,
                fulfill_reactions: Vec::new(),
                reject_reactions: Vec::new(),
            })),
            runtime: runtime.clone(),
        }
    }

    /// Construct a future from an initializer
    ///
    /// The initializer is called synchronously, once, with two capabilities:
    /// settle-fulfilled and settle-rejected. A fault returned by the
    /// initializer rejects the future. A non-callable initializer is a
    /// [`RuntimeError::TypeConfig`] and no future is created.
    pub fn new(runtime: &Runtime, initializer: &Value) -> Result<Self, RuntimeError> {
        if !initializer.is_callable() {
            return Err(RuntimeError::TypeConfig {
                msg: format!("Future initializer {} is not a function", initializer),
            });
        }

        let future = Self::pending(runtime);
        let (resolve, reject) = future.capabilities();
        if let Err(fault) = initializer.call(&Value::Undefined, &[resolve, reject]) {
            debug!(future = future.id, "initializer faulted");
            future.settle_rejected(fault.into_reason());
        }
        Ok(future)
    }

    /// Construct a future from a Rust initializer
    ///
    /// Same contract as [`Future::new`], without the callability check.
    pub fn from_fn<F>(runtime: &Runtime, initializer: F) -> Self
    where
        F: FnOnce(Value, Value) -> Result<(), RuntimeError>,
    {
        let future = Self::pending(runtime);
        let (resolve, reject) = future.capabilities();
        if let Err(fault) = initializer(resolve, reject) {
            debug!(future = future.id, "initializer faulted");
            future.settle_rejected(fault.into_reason());
        }
        future
    }

    /// Create an already-fulfilled future
    ///
    /// The value is stored as-is, even if it is itself a future.
    pub fn resolved(runtime: &Runtime, value: impl Into<Value>) -> Self {
        let future = Self::pending(runtime);
        future.settle_fulfilled(value.into());
        future
    }

    /// Create an already-rejected future
    pub fn rejected(runtime: &Runtime, reason: impl Into<Value>) -> Self {
        let future = Self::pending(runtime);
        future.settle_rejected(reason.into());
        future
    }

    /// Process-unique id, used in logs and error messages
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Current state discriminant. The outcome itself is only observable via `then`.
    pub fn state_kind(&self) -> StateKind {
        match self.inner.borrow().state {
            FutureState::Pending => StateKind::Pending,
            FutureState::Fulfilled(_) => StateKind::Fulfilled,
            FutureState::Rejected(_) => StateKind::Rejected,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state_kind() == StateKind::Pending
    }

    pub fn is_fulfilled(&self) -> bool {
        self.state_kind() == StateKind::Fulfilled
    }

    pub fn is_rejected(&self) -> bool {
        self.state_kind() == StateKind::Rejected
    }

    /// Whether both handles refer to the same future
    pub fn ptr_eq(&self, other: &Future) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The settle-fulfilled and settle-rejected capabilities, as callable values
    pub(crate) fn capabilities(&self) -> (Value, Value) {
        let target = self.clone();
        let resolve = Value::function(move |_, args| {
            target.settle_fulfilled(arg(args, 0));
            Ok(Value::Undefined)
        });
        let target = self.clone();
        let reject = Value::function(move |_, args| {
            target.settle_rejected(arg(args, 0));
            Ok(Value::Undefined)
        });
        (resolve, reject)
    }

    /// Fulfill the future. No-op unless pending.
    ///
    /// Does not unwrap futures or thenables passed as `value`.
    pub(crate) fn settle_fulfilled(&self, value: Value) {
        self.settle(FutureState::Fulfilled(value));
    }

    /// Reject the future. No-op unless pending.
    pub(crate) fn settle_rejected(&self, reason: Value) {
        self.settle(FutureState::Rejected(reason));
    }

    fn settle(&self, outcome: FutureState) {
        let (reactions, discarded, argument) = {
            let mut inner = self.inner.borrow_mut();
            if !matches!(inner.state, FutureState::Pending) {
                trace!(future = self.id, "ignoring settlement of a settled future");
                return;
            }
            let (argument, fulfilling) = match &outcome {
                FutureState::Fulfilled(value) => (value.clone(), true),
                FutureState::Rejected(reason) => (reason.clone(), false),
                FutureState::Pending => return,
            };
            let fulfilled = std::mem::take(&mut inner.fulfill_reactions);
            let rejected = std::mem::take(&mut inner.reject_reactions);
            let (reactions, discarded) = if fulfilling {
                (fulfilled, rejected)
            } else {
                (rejected, fulfilled)
            };
            inner.state = outcome;
            (reactions, discarded, argument)
        };
        drop(discarded);

        debug!(
            future = self.id,
            state = %self.state_kind(),
            reactions = reactions.len(),
            "future settled"
        );
        for Reaction { handler, derived } in reactions {
            dispatch(&self.runtime, handler, argument.clone(), derived);
        }
    }

    /// Register reactions and derive a new future from their outcome
    ///
    /// A non-callable `on_fulfilled` passes the value through; a non-callable
    /// `on_rejected` passes the reason through. Whichever handler runs, its
    /// result goes through the resolution procedure against the returned
    /// future; a fault rejects it. The returned future is never settled before
    /// `then` returns.
    pub fn then(&self, on_fulfilled: &Value, on_rejected: &Value) -> Future {
        let derived = Future::pending(&self.runtime);
        let on_fulfilled = Handler::on_fulfilled(on_fulfilled);
        let on_rejected = Handler::on_rejected(on_rejected);

        let current = self.inner.borrow().state.clone();
        match current {
            FutureState::Pending => {
                let mut inner = self.inner.borrow_mut();
                inner.fulfill_reactions.push(Reaction {
                    handler: on_fulfilled,
                    derived: derived.clone(),
                });
                inner.reject_reactions.push(Reaction {
                    handler: on_rejected,
                    derived: derived.clone(),
                });
            }
            FutureState::Fulfilled(value) => {
                dispatch(&self.runtime, on_fulfilled, value, derived.clone());
            }
            FutureState::Rejected(reason) => {
                dispatch(&self.runtime, on_rejected, reason, derived.clone());
            }
        }

        trace!(future = self.id, derived = derived.id, "reaction registered");
        derived
    }

    /// Register a rejection handler only
    pub fn catch(&self, on_rejected: &Value) -> Future {
        self.then(&Value::Undefined, on_rejected)
    }
}

/// Schedule a handler run whose outcome settles `derived`
fn dispatch(runtime: &Runtime, handler: Handler, argument: Value, derived: Future) {
    runtime.schedule(Box::new(move || match handler.invoke(argument) {
        Ok(candidate) => resolve::resolve_future(&derived, candidate),
        Err(fault) => derived.settle_rejected(fault.into_reason()),
    }));
}

impl PartialEq for Future {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Future {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Future#{}({:?})", self.id, self.state_kind())
    }
}

impl fmt::Display for Future {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Future#{}({})", self.id, self.state_kind())
    }
}

/// A pending future together with its settlement capabilities
///
/// Lets callers settle a future from outside an initializer.
#[derive(Clone)]
pub struct Deferred {
    pub future: Future,
    resolve: Value,
    reject: Value,
}

impl Deferred {
    /// The settle-fulfilled capability, as a callable value
    pub fn resolve(&self) -> &Value {
        &self.resolve
    }

    /// The settle-rejected capability, as a callable value
    pub fn reject(&self) -> &Value {
        &self.reject
    }

    /// Fulfill the future. No-op unless pending.
    pub fn settle_fulfilled(&self, value: impl Into<Value>) {
        self.future.settle_fulfilled(value.into());
    }

    /// Reject the future. No-op unless pending.
    pub fn settle_rejected(&self, reason: impl Into<Value>) {
        self.future.settle_rejected(reason.into());
    }
}

/// Create a pending future and expose its capabilities
pub fn deferred(runtime: &Runtime) -> Deferred {
    let future = Future::pending(runtime);
    let (resolve, reject) = future.capabilities();
    Deferred {
        future,
        resolve,
        reject,
    }
}
