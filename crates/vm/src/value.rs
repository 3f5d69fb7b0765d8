//! Runtime values.
//!
//! Values are cheap to clone: strings and lists are reference counted and
//! streams are shared mutable cursors.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::builtins::BuiltinId;
use crate::graph::NodeId;
use crate::stream::{Range, Stream};

/// A value on the value stack, in a local slot or in a global cell.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Padding for unassigned local slots.
    #[default]
    Absent,
    Bool(bool),
    Int(i64),
    Char(char),
    Str(Rc<str>),
    List(Rc<[Value]>),
    Range(Range),
    /// A callable: handle to a function-template node.
    Function(NodeId),
    /// A built-in used as a first-class value.
    Builtin(BuiltinId),
    Stream(Rc<RefCell<Stream>>),
}

impl Value {
    /// Immutable list of `items`.
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(items.into())
    }

    pub fn stream(stream: Stream) -> Self {
        Value::Stream(Rc::new(RefCell::new(stream)))
    }

    /// Short name of the value's kind, used in type-mismatch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Absent => "absent",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Range(_) => "range",
            Value::Function(_) => "function",
            Value::Builtin(_) => "sysfn",
            Value::Stream(_) => "stream",
        }
    }

    /// Debugging rendering: like `Display` but strings are quoted.
    pub fn show(&self) -> String {
        match self {
            Value::Str(s) => format!("\"{s}\""),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Absent => write!(f, "absent"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item.show())?;
                }
                write!(f, "]")
            }
            Value::Range(range) => write!(f, "{range}"),
            Value::Function(node) => write!(f, "<function {node}>"),
            Value::Builtin(id) => write!(f, "<sysfn {id}>"),
            Value::Stream(_) => write!(f, "<stream>"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Absent, Value::Absent) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Stream(a), Value::Stream(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s.into())
    }
}
