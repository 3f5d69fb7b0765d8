//! Assertions used by unit tests.

use crate::error::RuntimeError;
use crate::machine::{type_mismatch, Machine};
use crate::value::Value;

fn text(value: Value) -> String {
    value.to_string()
}

pub(super) fn assert(machine: &mut Machine) -> Result<(), RuntimeError> {
    if machine.pop_bool()? {
        return Ok(());
    }
    Err(RuntimeError::AssertionFailed {
        unit: String::new(),
        position: String::new(),
        details: Vec::new(),
    })
}

/// `assertTrue(condition, unit, position)`
pub(super) fn assert_true(machine: &mut Machine) -> Result<(), RuntimeError> {
    let position = text(machine.pop()?);
    let unit = text(machine.pop()?);
    match machine.pop()? {
        Value::Bool(true) => Ok(()),
        Value::Bool(false) => Err(RuntimeError::AssertionFailed {
            unit,
            position,
            details: Vec::new(),
        }),
        other => Err(type_mismatch("bool", &other)),
    }
}

fn compare(machine: &mut Machine, want_equal: bool) -> Result<(), RuntimeError> {
    let position = text(machine.pop()?);
    let unit = text(machine.pop()?);
    let right = machine.pop()?;
    let left = machine.pop()?;
    if (left == right) == want_equal {
        return Ok(());
    }
    Err(RuntimeError::AssertionFailed {
        unit,
        position,
        details: vec![("Left Value", left.show()), ("Right Value", right.show())],
    })
}

/// `assertEquals(left, right, unit, position)`
pub(super) fn assert_equals(machine: &mut Machine) -> Result<(), RuntimeError> {
    compare(machine, true)
}

/// `assertNotEquals(left, right, unit, position)`
pub(super) fn assert_not_equals(machine: &mut Machine) -> Result<(), RuntimeError> {
    compare(machine, false)
}
