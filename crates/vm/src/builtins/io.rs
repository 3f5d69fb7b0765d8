//! Output to the engine's sink.

use std::io::Write;

use crate::error::RuntimeError;
use crate::machine::Machine;
use crate::value::Value;

fn write_line(machine: &mut Machine, render: fn(&Value) -> String) -> Result<(), RuntimeError> {
    let line = machine
        .pop_args()?
        .iter()
        .map(render)
        .collect::<Vec<_>>()
        .join(" ");
    let out = machine.output();
    writeln!(out, "{line}")?;
    out.flush()?;
    Ok(())
}

/// Print the arguments separated by spaces.
pub(super) fn println(machine: &mut Machine) -> Result<(), RuntimeError> {
    write_line(machine, Value::to_string)
}

/// Like `println`, but strings are quoted.
pub(super) fn show_me(machine: &mut Machine) -> Result<(), RuntimeError> {
    write_line(machine, Value::show)
}
