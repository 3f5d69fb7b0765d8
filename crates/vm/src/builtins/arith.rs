//! Integer arithmetic. Overflow wraps.

use crate::error::RuntimeError;
use crate::machine::Machine;
use crate::value::Value;

fn binary(machine: &mut Machine, op: fn(i64, i64) -> i64) -> Result<(), RuntimeError> {
    let y = machine.pop_int()?;
    let x = machine.pop_int()?;
    machine.push(Value::Int(op(x, y)));
    Ok(())
}

pub(super) fn add(machine: &mut Machine) -> Result<(), RuntimeError> {
    binary(machine, i64::wrapping_add)
}

pub(super) fn sub(machine: &mut Machine) -> Result<(), RuntimeError> {
    binary(machine, i64::wrapping_sub)
}

pub(super) fn mul(machine: &mut Machine) -> Result<(), RuntimeError> {
    binary(machine, i64::wrapping_mul)
}

pub(super) fn sum(machine: &mut Machine) -> Result<(), RuntimeError> {
    let mut total = 0i64;
    for _ in 0..machine.nargs() {
        total = total.wrapping_add(machine.pop_int()?);
    }
    machine.push(Value::Int(total));
    Ok(())
}
