//! Sequences: lists, lengths, indexing and streams.

use crate::error::RuntimeError;
use crate::machine::{type_mismatch, Machine};
use crate::stream::Stream;
use crate::value::Value;

pub(super) fn new_immutable_list(machine: &mut Machine) -> Result<(), RuntimeError> {
    let items = machine.pop_args()?;
    machine.push(Value::list(items));
    Ok(())
}

pub(super) fn length(machine: &mut Machine) -> Result<(), RuntimeError> {
    let len = match machine.pop()? {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Range(range) => range.len(),
        other => return Err(type_mismatch("sequence", &other)),
    };
    machine.push(count(len)?);
    Ok(())
}

fn count(len: usize) -> Result<Value, RuntimeError> {
    i64::try_from(len)
        .map(Value::Int)
        .map_err(|_| RuntimeError::IntOverflow {
            found: len.to_string(),
        })
}

fn item(seq: &Value, position: &Value) -> Result<Value, RuntimeError> {
    let index = match position {
        Value::Int(n) if *n >= 0 => *n as usize,
        other => return Err(type_mismatch("non-negative int", other)),
    };
    let found = match seq {
        Value::Str(s) => s.chars().nth(index).map(Value::Char),
        Value::List(items) => items.get(index).cloned(),
        Value::Range(range) => range.get(index).map(Value::Int),
        other => return Err(type_mismatch("sequence", other)),
    };
    found.ok_or(RuntimeError::SlotOutOfRange {
        index,
        size: match seq {
            Value::Str(s) => s.chars().count(),
            Value::List(items) => items.len(),
            Value::Range(range) => range.len(),
            _ => 0,
        },
    })
}

/// `get(seq, i, j, ...)` pushes `seq[i]`, `seq[j]`, ... in order.
pub(super) fn get(machine: &mut Machine) -> Result<(), RuntimeError> {
    let args = machine.pop_args()?;
    let Some((seq, positions)) = args.split_first() else {
        return Err(RuntimeError::ArityMismatch {
            expected: 1,
            found: 0,
        });
    };
    for position in positions {
        machine.push(item(seq, position)?);
    }
    Ok(())
}

pub(super) fn stream(machine: &mut Machine) -> Result<(), RuntimeError> {
    let source = machine.pop()?;
    machine.push(Value::stream(Stream::over(&source)?));
    Ok(())
}
