//! Graphviz rendering of woven code.
//!
//! Nodes are named `"N. Title"` in order of first mention. Each visited
//! node produces one line listing its successors:
//!
//! ```text
//! digraph main { node [shape=box];
//! "0. Lock" -> { "1. PushQ 3" }
//! "1. PushQ 3" -> { "2. Halt" }
//! "2. Halt" -> { }
//! }
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::builtins::Catalog;
use crate::error::RuntimeError;
use crate::execute::Engine;
use crate::graph::{Graph, NodeId};
use crate::value::Value;

struct Namer<'a> {
    graph: &'a Graph,
    catalog: &'a Catalog,
    names: HashMap<NodeId, String>,
}

impl Namer<'_> {
    fn name(&mut self, id: NodeId) -> String {
        let count = self.names.len();
        let (graph, catalog) = (self.graph, self.catalog);
        self.names
            .entry(id)
            .or_insert_with(|| {
                let title = graph.short_title(id, catalog).replace('"', "\\\"");
                format!("\"{count}. {title}\"")
            })
            .clone()
    }
}

/// Render every node reachable from `entry`. Cycles are visited once.
pub fn render_dot(
    graph: &Graph,
    catalog: &Catalog,
    name: &str,
    entry: NodeId,
) -> Result<String, RuntimeError> {
    let mut out = String::new();
    write_dot(&mut out, graph, catalog, name, entry).map_err(|err| RuntimeError::Output {
        message: err.to_string(),
    })?;
    Ok(out)
}

/// As [`render_dot`], writing into `out`.
pub fn write_dot(
    out: &mut impl fmt::Write,
    graph: &Graph,
    catalog: &Catalog,
    name: &str,
    entry: NodeId,
) -> fmt::Result {
    let mut namer = Namer {
        graph,
        catalog,
        names: HashMap::new(),
    };
    writeln!(out, "digraph {name} {{ node [shape=box];")?;
    for id in graph.reachable(entry) {
        write!(out, "{} -> {{", namer.name(id))?;
        for next in graph[id].successors() {
            write!(out, " {}", namer.name(next))?;
        }
        writeln!(out, " }}")?;
    }
    writeln!(out, "}}")
}

impl Engine {
    /// Render the code of the global function `name`.
    pub fn to_dot(&self, name: &str) -> Result<String, RuntimeError> {
        let globals = self.globals();
        let id = globals
            .lookup(name)
            .ok_or_else(|| RuntimeError::UnknownIdentifier {
                name: name.to_string(),
            })?;
        match globals.get(id)? {
            Value::Function(entry) => render_dot(&self.graph, &self.catalog, name, *entry),
            other => Err(RuntimeError::TypeMismatch {
                expected: "function",
                found: other.show(),
            }),
        }
    }
}
