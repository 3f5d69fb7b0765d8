//! Machine state: the value stack, the call stack, globals and registers.
//!
//! The value stack is checked; the call stack is unchecked because only
//! woven code manipulates it. Call-stack slots hold locals and the saved
//! return linkage of each frame:
//!
//! ```text
//! ... | Return(node) | Alt(false) || local 0 | local 1 | ... |
//!                                 ^ frame floor (locked)
//! ```

use std::fmt;
use std::io::Write;

use crate::error::RuntimeError;
use crate::globals::Globals;
use crate::graph::NodeId;
use crate::stack::{CheckedLayeredStack, LayeredStack, UncheckedLayeredStack};
use crate::value::Value;

/// One call-stack item.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// An argument or local variable.
    Local(Value),
    /// Where the caller resumes.
    Return(NodeId),
    Alt(bool),
}

impl Default for Slot {
    fn default() -> Self {
        Slot::Local(Value::Absent)
    }
}

impl From<Value> for Slot {
    fn from(value: Value) -> Self {
        Slot::Local(value)
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Initial item capacity of each stack. Stacks grow on demand.
    pub stack_capacity: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            stack_capacity: crate::stack::DEFAULT_CAPACITY,
        }
    }
}

/// Registers and stacks of a running engine.
pub struct Machine {
    pub(crate) values: CheckedLayeredStack<Value>,
    pub(crate) calls: UncheckedLayeredStack<Slot>,
    pub(crate) globals: Globals,
    /// Argument count recorded by the last `CountAndUnlock`.
    pub(crate) nargs: usize,
    pub(crate) output: Box<dyn Write>,
    capacity: usize,
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("values", &self.values)
            .field("calls", &self.calls)
            .field("globals", &self.globals.len())
            .field("nargs", &self.nargs)
            .finish_non_exhaustive()
    }
}

impl Machine {
    /// Empty stacks sized by `options`, printing to `output`.
    pub fn new(options: &EngineOptions, output: Box<dyn Write>) -> Self {
        Self {
            values: CheckedLayeredStack::with_capacity(options.stack_capacity),
            calls: UncheckedLayeredStack::with_capacity(options.stack_capacity),
            globals: Globals::new(),
            nargs: 0,
            output,
            capacity: options.stack_capacity,
        }
    }

    /// Discard both stacks and the argument register. Globals survive.
    pub fn reset(&mut self) {
        self.values = CheckedLayeredStack::with_capacity(self.capacity);
        self.calls = UncheckedLayeredStack::with_capacity(self.capacity);
        self.nargs = 0;
    }

    /// Push onto the current value-stack layer.
    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Pop from the current value-stack layer; fails at the layer floor.
    pub fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.values.pop()
    }

    /// Pop an integer, failing with a type mismatch for anything else.
    pub fn pop_int(&mut self) -> Result<i64, RuntimeError> {
        match self.pop()? {
            Value::Int(n) => Ok(n),
            other => Err(type_mismatch("int", &other)),
        }
    }

    /// Pop a boolean, failing with a type mismatch for anything else.
    pub fn pop_bool(&mut self) -> Result<bool, RuntimeError> {
        match self.pop()? {
            Value::Bool(b) => Ok(b),
            other => Err(type_mismatch("bool", &other)),
        }
    }

    /// As [`Machine::pop_bool`], leaving the value in place.
    pub fn peek_bool(&self) -> Result<bool, RuntimeError> {
        match self.values.peek()? {
            Value::Bool(b) => Ok(b),
            other => Err(type_mismatch("bool", &other)),
        }
    }

    /// Number of arguments passed to the running variadic built-in.
    pub fn nargs(&self) -> usize {
        self.nargs
    }

    /// Pop the arguments of a variadic built-in, first argument first.
    pub fn pop_args(&mut self) -> Result<Vec<Value>, RuntimeError> {
        let mut args = (0..self.nargs)
            .map(|_| self.values.pop())
            .collect::<Result<Vec<_>, _>>()?;
        args.reverse();
        Ok(args)
    }

    /// Sink for printing built-ins and result dumps.
    pub fn output(&mut self) -> &mut dyn Write {
        self.output.as_mut()
    }

    /// The global table.
    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    /// Current layer of the value stack, bottom first.
    pub fn values(&self) -> Vec<Value> {
        self.values.snapshot()
    }

    pub(crate) fn local(&self, slot: usize) -> Result<Value, RuntimeError> {
        match self.calls.get(slot)? {
            Slot::Local(value) => Ok(value),
            Slot::Return(_) | Slot::Alt(_) => Err(RuntimeError::Unreachable {
                what: "local slot holds frame linkage",
            }),
        }
    }

    pub(crate) fn set_local(&mut self, slot: usize, value: Value) -> Result<(), RuntimeError> {
        self.calls.set(slot, Slot::Local(value))
    }

    /// Write the value-stack dump, top of stack first.
    pub(crate) fn print_results(&mut self) -> Result<(), RuntimeError> {
        let count = self.values.size();
        if count == 1 {
            writeln!(self.output, "There is 1 item returned")?;
        } else {
            writeln!(self.output, "There are {count} items returned")?;
        }
        for offset in 0..count {
            let item = self.values.peek_at(offset)?;
            writeln!(self.output, "{}: {}", offset + 1, item.show())?;
        }
        self.output.flush()?;
        Ok(())
    }
}

pub(crate) fn type_mismatch(expected: &'static str, found: &Value) -> RuntimeError {
    RuntimeError::TypeMismatch {
        expected,
        found: found.show(),
    }
}
