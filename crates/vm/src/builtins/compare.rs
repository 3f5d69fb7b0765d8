//! Comparisons. Ordering works on integers; equality on any values.

use crate::error::RuntimeError;
use crate::machine::Machine;
use crate::value::Value;

fn ordering(machine: &mut Machine, op: fn(&i64, &i64) -> bool) -> Result<(), RuntimeError> {
    let y = machine.pop_int()?;
    let x = machine.pop_int()?;
    machine.push(Value::Bool(op(&x, &y)));
    Ok(())
}

pub(super) fn lt(machine: &mut Machine) -> Result<(), RuntimeError> {
    ordering(machine, i64::lt)
}

pub(super) fn lte(machine: &mut Machine) -> Result<(), RuntimeError> {
    ordering(machine, i64::le)
}

pub(super) fn gt(machine: &mut Machine) -> Result<(), RuntimeError> {
    ordering(machine, i64::gt)
}

pub(super) fn gte(machine: &mut Machine) -> Result<(), RuntimeError> {
    ordering(machine, i64::ge)
}

pub(super) fn eq(machine: &mut Machine) -> Result<(), RuntimeError> {
    let y = machine.pop()?;
    let x = machine.pop()?;
    machine.push(Value::Bool(x == y));
    Ok(())
}
