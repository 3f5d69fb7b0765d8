//! Global variable table.
//!
//! Every global is pre-registered by name before any code is woven, so
//! woven nodes refer to cells by [`GlobalId`] and forward references work.
//! Each cell is written once.

use std::collections::HashMap;
use std::fmt;

use crate::error::RuntimeError;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalId(u32);

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Cell {
    name: String,
    value: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct Globals {
    cells: Vec<Cell>,
    by_name: HashMap<String, GlobalId>,
}

impl Globals {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`, returning its cell. Registering twice returns the
    /// same cell.
    pub fn declare(&mut self, name: &str) -> GlobalId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = GlobalId(self.cells.len() as u32);
        self.cells.push(Cell {
            name: name.to_string(),
            value: None,
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// The cell declared for `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<GlobalId> {
        self.by_name.get(name).copied()
    }

    /// The name `id` was declared with.
    pub fn name(&self, id: GlobalId) -> &str {
        self.cells
            .get(id.0 as usize)
            .map_or("?", |cell| cell.name.as_str())
    }

    /// Current value, or `None` if the cell is still unassigned.
    pub fn value(&self, id: GlobalId) -> Option<&Value> {
        self.cells.get(id.0 as usize)?.value.as_ref()
    }

    /// Read a cell that must already be assigned.
    pub fn get(&self, id: GlobalId) -> Result<&Value, RuntimeError> {
        self.value(id)
            .ok_or_else(|| RuntimeError::UninitialisedGlobal {
                name: self.name(id).to_string(),
            })
    }

    /// Write a cell for the first and only time.
    pub fn assign(&mut self, id: GlobalId, value: Value) -> Result<(), RuntimeError> {
        let cell = self
            .cells
            .get_mut(id.0 as usize)
            .ok_or(RuntimeError::Unreachable {
                what: "global id from another table",
            })?;
        if cell.value.is_some() {
            return Err(RuntimeError::GlobalAlreadyAssigned {
                name: cell.name.clone(),
            });
        }
        cell.value = Some(value);
        Ok(())
    }

    /// Number of declared cells, assigned or not.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
