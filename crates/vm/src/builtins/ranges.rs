//! Integer ranges, either spread onto the stack or as range values.

use crate::error::RuntimeError;
use crate::machine::Machine;
use crate::stream::Range;
use crate::value::Value;

fn bounds(machine: &mut Machine) -> Result<(i64, i64), RuntimeError> {
    let y = machine.pop_int()?;
    let x = machine.pop_int()?;
    Ok((x, y))
}

fn spread(machine: &mut Machine, range: Range) {
    for n in range.iter() {
        machine.push(Value::Int(n));
    }
}

pub(super) fn half_open_range(machine: &mut Machine) -> Result<(), RuntimeError> {
    let (x, y) = bounds(machine)?;
    spread(machine, Range::half_open(x, y)?);
    Ok(())
}

pub(super) fn closed_range(machine: &mut Machine) -> Result<(), RuntimeError> {
    let (x, y) = bounds(machine)?;
    spread(machine, Range::closed(x, y)?);
    Ok(())
}

pub(super) fn half_open_range_list(machine: &mut Machine) -> Result<(), RuntimeError> {
    let (x, y) = bounds(machine)?;
    machine.push(Value::Range(Range::half_open(x, y)?));
    Ok(())
}

pub(super) fn closed_range_list(machine: &mut Machine) -> Result<(), RuntimeError> {
    let (x, y) = bounds(machine)?;
    machine.push(Value::Range(Range::closed(x, y)?));
    Ok(())
}
