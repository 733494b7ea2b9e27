//! Runtime value representation
//!
//! Values that flow through futures: settlement values, rejection reasons,
//! reaction handlers and the candidates fed to the resolution procedure.
//! - Undefined, Null, Bool, Number: Immediate values
//! - Strings and Arrays: Reference-counted, immutable
//! - Objects: Shared property bags with data and accessor members
//! - Functions: Native closures with an explicit receiver
//! - Futures: Handles to a pledge future (identity semantics)
//! - Errors: Error values produced by the runtime itself
//!
//! Everything is single-threaded (`Rc`), matching the callback execution model.

use crate::async_runtime::Future;
use crate::error::RuntimeError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Native function type - Rust closure callable as a value
///
/// Receives the receiver (`this`) and the argument list, returns either a value
/// or a fault. Faults are how a callback "throws".
pub type NativeFn = Rc<dyn Fn(&Value, &[Value]) -> Result<Value, RuntimeError>>;

/// Runtime value type
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value (missing argument, no return value)
    #[default]
    Undefined,
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (IEEE 754 double-precision)
    Number(f64),
    /// String value (reference-counted, immutable)
    String(Rc<str>),
    /// Array value (reference-counted, immutable)
    Array(Rc<Vec<Value>>),
    /// Object with named members
    Object(ObjectRef),
    /// Callable native function, optionally carrying members of its own
    Function(NativeFn, Option<ObjectRef>),
    /// A pledge future
    Future(Future),
    /// Error value produced by the runtime
    Error(ErrorValue),
}

impl Value {
    /// Create a new string value
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Rc::from(s.as_ref()))
    }

    /// Create a new array value
    pub fn array(values: Vec<Value>) -> Self {
        Value::Array(Rc::new(values))
    }

    /// Wrap a Rust closure as a callable value
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, RuntimeError> + 'static,
    {
        Value::Function(Rc::new(f), None)
    }

    /// Wrap a Rust closure as a callable value that also exposes `members`
    pub fn function_with_members<F>(f: F, members: ObjectRef) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, RuntimeError> + 'static,
    {
        Value::Function(Rc::new(f), Some(members))
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(..) => "function",
            Value::Future(_) => "future",
            Value::Error(_) => "error",
        }
    }

    /// Whether the value can be invoked with [`Value::call`]
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(..))
    }

    /// Invoke a callable value with an explicit receiver
    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
        match self {
            Value::Function(f, _) => f(this, args),
            other => Err(RuntimeError::TypeError {
                msg: format!("{} is not a function", other),
            }),
        }
    }

    /// Read a named member
    ///
    /// Objects and functions with members consult their properties (running
    /// accessors, which may fault). Every other value reads as undefined.
    pub fn get_member(&self, name: &str) -> Result<Value, RuntimeError> {
        match self {
            Value::Object(object) | Value::Function(_, Some(object)) => object.get(self, name),
            _ => Ok(Value::Undefined),
        }
    }

    /// Borrow the future handle if this value is a future
    pub fn as_future(&self) -> Option<&Future> {
        match self {
            Value::Future(future) => Some(future),
            _ => None,
        }
    }

    /// Borrow the error value if this is one
    pub fn as_error(&self) -> Option<&ErrorValue> {
        match self {
            Value::Error(error) => Some(error),
            _ => None,
        }
    }
}

/// Fetch a positional argument, defaulting to undefined
pub fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a, _), Value::Function(b, _)) => {
                // Identity only; compare data pointers and ignore vtables.
                Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
            }
            (Value::Future(a), Value::Future(b)) => a.ptr_eq(b),
            (Value::Error(a), Value::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(_) => write!(f, "[object]"),
            Value::Function(..) => write!(f, "[function]"),
            Value::Future(future) => write!(f, "{}", future),
            Value::Error(error) => write!(f, "{}", error),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Value::Object(object) => write!(f, "Object({:?})", object.keys()),
            Value::Function(_, None) => write!(f, "Function"),
            Value::Function(_, Some(members)) => write!(f, "Function({:?})", members.keys()),
            Value::Future(future) => write!(f, "{:?}", future),
            Value::Error(error) => write!(f, "{:?}", error),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Future> for Value {
    fn from(future: Future) -> Self {
        Value::Future(future)
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(object)
    }
}

/// A member slot on an object
#[derive(Clone)]
pub enum Property {
    /// Plain stored value
    Data(Value),
    /// Getter invoked with the object as receiver on every read
    Accessor(NativeFn),
}

/// Shared, mutable property bag. Clones alias the same object.
#[derive(Clone, Default)]
pub struct ObjectRef(Rc<RefCell<HashMap<String, Property>>>);

impl ObjectRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a data member, replacing any previous member of that name
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) -> &Self {
        self.0
            .borrow_mut()
            .insert(name.into(), Property::Data(value.into()));
        self
    }

    /// Define an accessor member
    pub fn define_getter<F>(&self, name: impl Into<String>, getter: F) -> &Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, RuntimeError> + 'static,
    {
        self.0
            .borrow_mut()
            .insert(name.into(), Property::Accessor(Rc::new(getter)));
        self
    }

    /// Read a member. `this` is the value the getter sees as receiver.
    pub fn get(&self, this: &Value, name: &str) -> Result<Value, RuntimeError> {
        // Release the borrow before running a getter; it may touch this object.
        let property = self.0.borrow().get(name).cloned();
        match property {
            Some(Property::Data(value)) => Ok(value),
            Some(Property::Accessor(getter)) => getter(this, &[]),
            None => Ok(Value::Undefined),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.borrow().contains_key(name)
    }

    /// Member names, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.0.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Kind of runtime-produced error value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A non-callable value was invoked
    TypeError,
    /// A reaction returned the future it was settling
    ChainCycle,
    /// Resolution exceeded the configured step limit
    ChainDepthExceeded,
    /// The event loop ran out of turns
    TurnBudget,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ChainCycle => "ChainCycleError",
            ErrorKind::ChainDepthExceeded => "ChainDepthError",
            ErrorKind::TurnBudget => "TurnBudgetError",
        }
    }
}

/// Error value carried as a rejection reason
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorValue {
    kind: ErrorKind,
    message: Rc<str>,
}

impl ErrorValue {
    pub fn new(kind: ErrorKind, message: impl AsRef<str>) -> Self {
        Self {
            kind,
            message: Rc::from(message.as_ref()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.name(), self.message)
    }
}
