//! Built-in (system) functions.
//!
//! A built-in is a host function registered in a [`Catalog`] under one or
//! more names. The weaver resolves names at weave time and emits a
//! [`Runlet::Builtin`](crate::graph::Runlet::Builtin) node. Bodies never
//! touch stack locks:
//!
//! - [`BuiltinArity::Fixed`]`(n)`: the argument count has been checked
//!   before the body runs, so the body pops exactly `n` values.
//! - [`BuiltinArity::Variadic`]: the count of arguments sits in the
//!   machine's argument-count register; the body pops that many values with
//!   [`Machine::pop_args`].
//!
//! Results are pushed onto the value stack.

mod arith;
mod assert;
mod compare;
mod io;
mod ranges;
mod seqs;

use std::collections::HashMap;
use std::fmt;

use crate::error::RuntimeError;
use crate::machine::Machine;

/// Body of a built-in.
pub type BuiltinFn = fn(&mut Machine) -> Result<(), RuntimeError>;

/// Handle to a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuiltinId(u32);

impl fmt::Display for BuiltinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinArity {
    Fixed(usize),
    Variadic,
}

impl fmt::Display for BuiltinArity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuiltinArity::Fixed(n) => write!(f, "{n}"),
            BuiltinArity::Variadic => write!(f, "0+"),
        }
    }
}

#[derive(Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: BuiltinArity,
    pub body: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Name-to-built-in registry.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<Builtin>,
    by_name: HashMap<&'static str, BuiltinId>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-ins shipped with the runner.
    pub fn standard() -> Self {
        use BuiltinArity::{Fixed, Variadic};

        let mut catalog = Catalog::new();
        catalog
            .add("println", Variadic, io::println, &[])
            .add("showMe", Variadic, io::show_me, &[])
            .add("+", Fixed(2), arith::add, &["add"])
            .add("-", Fixed(2), arith::sub, &["sub"])
            .add("*", Fixed(2), arith::mul, &["mul"])
            .add("sum", Variadic, arith::sum, &[])
            .add("<", Fixed(2), compare::lt, &["lessThan"])
            .add("<=", Fixed(2), compare::lte, &["lessThanOrEqualTo"])
            .add(">", Fixed(2), compare::gt, &["greaterThan"])
            .add(">=", Fixed(2), compare::gte, &["greaterThanOrEqualTo"])
            .add("==", Fixed(2), compare::eq, &["equals"])
            .add("..<", Fixed(2), ranges::half_open_range, &["halfOpenRange"])
            .add("...", Fixed(2), ranges::closed_range, &["closedRange"])
            .add("[x..<y]", Fixed(2), ranges::half_open_range_list, &["halfOpenRangeList"])
            .add("[x...y]", Fixed(2), ranges::closed_range_list, &["closedRangeList"])
            .add("newImmutableList", Variadic, seqs::new_immutable_list, &[])
            .add("length", Fixed(1), seqs::length, &[])
            .add("get", Variadic, seqs::get, &[])
            .add("stream", Fixed(1), seqs::stream, &[])
            .add("assert", Fixed(1), assert::assert, &[])
            .add("assertTrue", Fixed(3), assert::assert_true, &[])
            .add("assertEquals", Fixed(4), assert::assert_equals, &[])
            .add("assertNotEquals", Fixed(4), assert::assert_not_equals, &[]);
        catalog
    }

    /// Register `body` under `name` and every synonym. A later registration
    /// of an existing name replaces the earlier one.
    pub fn add(
        &mut self,
        name: &'static str,
        arity: BuiltinArity,
        body: BuiltinFn,
        synonyms: &[&'static str],
    ) -> &mut Self {
        let id = BuiltinId(self.entries.len() as u32);
        self.entries.push(Builtin { name, arity, body });
        self.by_name.insert(name, id);
        for synonym in synonyms {
            self.by_name.insert(*synonym, id);
        }
        self
    }

    pub fn resolve(&self, name: &str) -> Option<BuiltinId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: BuiltinId) -> Option<&Builtin> {
        self.entries.get(id.0 as usize)
    }

    /// Primary name of an entry.
    pub fn name(&self, id: BuiltinId) -> &str {
        self.get(id).map_or("?", |b| b.name)
    }

    /// Every registered name (synonyms included) with its entry, sorted by
    /// name.
    pub fn names(&self) -> Vec<(&'static str, &Builtin)> {
        let mut names: Vec<_> = self
            .by_name
            .iter()
            .filter_map(|(name, id)| Some((*name, self.get(*id)?)))
            .collect();
        names.sort_by(|a, b| a.0.cmp(b.0));
        names
    }
}
