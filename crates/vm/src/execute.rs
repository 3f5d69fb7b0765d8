//! The trampoline and node dispatch.
//!
//! [`Engine::run`] repeatedly executes the current node and moves to the
//! successor it returns. Nodes never call each other, so deep or tail
//! recursion in the running program never grows the host stack. A halting
//! node returns [`Step::Halt`] instead of a successor.

use std::io::Write;

use tracing::{debug, trace};

use crate::builtins::{BuiltinArity, Catalog};
use crate::error::RuntimeError;
use crate::globals::Globals;
use crate::graph::{Graph, NodeId, Runlet};
use crate::machine::{EngineOptions, Machine, Slot};
use crate::stack::LayeredStack;
use crate::value::Value;

/// Result of executing one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Execute this node next.
    Continue(NodeId),
    /// Stop the trampoline.
    Halt,
}

/// Mutable access to what the weaver needs while it appends nodes.
pub struct WeavingParts<'a> {
    pub graph: &'a mut Graph,
    pub globals: &'a Globals,
    pub catalog: &'a Catalog,
}

/// A graph of woven code together with the machine that runs it.
pub struct Engine {
    pub(crate) graph: Graph,
    pub(crate) catalog: Catalog,
    pub(crate) machine: Machine,
}

impl Engine {
    /// Create an engine writing to standard output.
    pub fn new(catalog: Catalog) -> Self {
        Self::with_options(catalog, EngineOptions::default())
    }

    /// Create an engine with explicit stack sizing.
    pub fn with_options(catalog: Catalog, options: EngineOptions) -> Self {
        Self {
            graph: Graph::new(),
            catalog,
            machine: Machine::new(&options, Box::new(std::io::stdout())),
        }
    }

    /// Redirect result dumps and printing built-ins to `output`.
    pub fn with_output(mut self, output: impl Write + 'static) -> Self {
        self.machine.output = Box::new(output);
        self
    }

    /// Woven code.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The global table.
    pub fn globals(&self) -> &Globals {
        &self.machine.globals
    }

    pub fn globals_mut(&mut self) -> &mut Globals {
        &mut self.machine.globals
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Borrow the graph mutably alongside the read-only tables the weaver
    /// resolves names against.
    pub fn weaving_parts(&mut self) -> WeavingParts<'_> {
        WeavingParts {
            graph: &mut self.graph,
            globals: &self.machine.globals,
            catalog: &self.catalog,
        }
    }

    /// Clear both stacks, keeping code and globals.
    pub fn reset(&mut self) {
        self.machine.reset();
    }

    /// Run from `entry` until a halting node.
    pub fn run(&mut self, entry: NodeId) -> Result<(), RuntimeError> {
        debug!(%entry, "run");
        let mut current = entry;
        loop {
            trace!(node = %current, "execute");
            match self.step(current)? {
                Step::Continue(next) => current = next,
                Step::Halt => break,
            }
        }
        debug!(results = self.machine.values.size(), "halted");
        Ok(())
    }

    /// Run the global `name`. A function or built-in is called with `args`
    /// as string arguments; any other value is simply returned. Returns the
    /// value stack after halting, bottom first.
    pub fn start(
        &mut self,
        name: &str,
        args: &[String],
        print: bool,
    ) -> Result<Vec<Value>, RuntimeError> {
        let globals = &self.machine.globals;
        let id = globals
            .lookup(name)
            .ok_or_else(|| RuntimeError::UnknownIdentifier {
                name: name.to_string(),
            })?;
        let value = globals.get(id)?.clone();
        debug!(entry = name, args = args.len(), "start");
        match value {
            Value::Function(function) => self.start_function(function, args, print),
            builtin @ Value::Builtin(_) => self.run_scratch(|graph| {
                let halt = graph.add(Runlet::Halt { print });
                let call = graph.add(Runlet::CallDynamic { next: halt });
                let callee = graph.add(Runlet::PushConstant {
                    value: builtin,
                    next: call,
                });
                let pushes = push_args(graph, args, callee);
                graph.add(Runlet::Lock { next: pushes })
            }),
            other => {
                self.machine.push(other);
                self.run_scratch(|graph| graph.add(Runlet::Halt { print }))
            }
        }
    }

    /// Call the function template `function` on string arguments.
    pub fn start_function(
        &mut self,
        function: NodeId,
        args: &[String],
        print: bool,
    ) -> Result<Vec<Value>, RuntimeError> {
        self.run_scratch(|graph| {
            let halt = graph.add(Runlet::Halt { print });
            let call = graph.add(Runlet::Call {
                function,
                next: halt,
            });
            let pushes = push_args(graph, args, call);
            graph.add(Runlet::Lock { next: pushes })
        })
    }

    /// Append entry nodes with `build`, run from the node it returns, then
    /// drop those nodes again so repeated starts leave the graph unchanged.
    pub fn run_scratch(
        &mut self,
        build: impl FnOnce(&mut Graph) -> NodeId,
    ) -> Result<Vec<Value>, RuntimeError> {
        let mark = self.graph.len();
        let entry = build(&mut self.graph);
        let outcome = self.run(entry);
        self.graph.truncate(mark);
        outcome.map(|()| self.machine.values())
    }

    pub(crate) fn step(&mut self, id: NodeId) -> Result<Step, RuntimeError> {
        let Engine {
            graph,
            catalog,
            machine,
        } = self;
        let runlet = graph.get(id).ok_or(RuntimeError::Unreachable {
            what: "jump to a missing node",
        })?;
        match runlet {
            Runlet::Placeholder { target, .. } => {
                target.map(Step::Continue).ok_or(RuntimeError::Unreachable {
                    what: "unresolved placeholder",
                })
            }
            Runlet::Halt { print } => {
                if *print {
                    machine.print_results()?;
                }
                Ok(Step::Halt)
            }
            Runlet::PushConstant { value, next } => {
                machine.push(value.clone());
                Ok(Step::Continue(*next))
            }
            Runlet::PushGlobal { global, next } => {
                let value = machine.globals.get(*global)?.clone();
                machine.push(value);
                Ok(Step::Continue(*next))
            }
            Runlet::PushLocal { slot, next } => {
                let value = machine.local(*slot)?;
                machine.push(value);
                Ok(Step::Continue(*next))
            }
            Runlet::PopIntoLocal { slot, next } => {
                let value = machine.pop()?;
                machine.set_local(*slot, value)?;
                Ok(Step::Continue(*next))
            }
            Runlet::PopIntoGlobal { global, next } => {
                let value = machine.pop()?;
                machine.globals.assign(*global, value)?;
                Ok(Step::Continue(*next))
            }
            Runlet::FunctionTemplate { next, .. } => {
                machine.push(Value::Function(id));
                next.map(Step::Continue).ok_or(RuntimeError::Unreachable {
                    what: "top-level function executed as an instruction",
                })
            }
            Runlet::Call { function, next } => machine.call(graph, *function, *next),
            Runlet::CallDynamic { next } => {
                let callee = machine.pop()?;
                machine.call_value(graph, catalog, callee, *next)
            }
            Runlet::Return => machine.return_from_call(),
            Runlet::Fork { then, otherwise } => Ok(Step::Continue(if machine.pop_bool()? {
                *then
            } else {
                *otherwise
            })),
            Runlet::And { rhs, next } => machine.short_circuit(true, *rhs, *next),
            Runlet::Or { rhs, next } => machine.short_circuit(false, *rhs, *next),
            Runlet::Lock { next } => {
                machine.values.lock();
                Ok(Step::Continue(*next))
            }
            Runlet::Unlock { next } => {
                machine.values.unlock()?;
                Ok(Step::Continue(*next))
            }
            Runlet::UnlockChecked { expected, next } => {
                let found = machine.values.size();
                if found != *expected {
                    return Err(RuntimeError::ArityMismatch {
                        expected: *expected,
                        found,
                    });
                }
                machine.values.unlock()?;
                machine.nargs = found;
                Ok(Step::Continue(*next))
            }
            Runlet::UnlockSingle { next } => {
                let found = machine.values.size();
                if found != 1 {
                    return Err(RuntimeError::WrongItemCount { expected: 1, found });
                }
                machine.values.unlock()?;
                Ok(Step::Continue(*next))
            }
            Runlet::CountAndUnlock { next } => {
                machine.nargs = machine.values.count_and_unlock()?;
                Ok(Step::Continue(*next))
            }
            Runlet::IterateSlot {
                slot,
                on_value,
                on_exhausted,
            } => machine.iterate_slot(*slot, *on_value, *on_exhausted),
            Runlet::Builtin { builtin, next } => {
                let body = catalog
                    .get(*builtin)
                    .ok_or(RuntimeError::Unreachable {
                        what: "built-in from another catalog",
                    })?
                    .body;
                body(machine)?;
                Ok(Step::Continue(*next))
            }
        }
    }
}

/// Push `args` in order, then continue at `next`.
fn push_args(graph: &mut Graph, args: &[String], next: NodeId) -> NodeId {
    args.iter().rev().fold(next, |next, arg| {
        graph.add(Runlet::PushConstant {
            value: Value::from(arg.as_str()),
            next,
        })
    })
}

impl Machine {
    /// Enter `function`: save the return linkage, move the locked argument
    /// layer into a new frame and check the argument count.
    fn call(&mut self, graph: &Graph, function: NodeId, next: NodeId) -> Result<Step, RuntimeError> {
        let Some(&Runlet::FunctionTemplate {
            arity,
            locals,
            entry,
            ..
        }) = graph.get(function)
        else {
            return Err(RuntimeError::Unreachable {
                what: "call of a node that is not a function",
            });
        };
        self.calls.push(Slot::Return(next));
        self.calls.push(Slot::Alt(false));
        let found = self.values.transfer_locked_region_into(&mut self.calls, locals);
        self.values.unlock()?;
        if found != arity {
            return Err(RuntimeError::ArityMismatch {
                expected: arity,
                found,
            });
        }
        Ok(Step::Continue(entry))
    }

    fn call_value(
        &mut self,
        graph: &Graph,
        catalog: &Catalog,
        callee: Value,
        next: NodeId,
    ) -> Result<Step, RuntimeError> {
        match callee {
            Value::Function(function) => self.call(graph, function, next),
            Value::Builtin(id) => {
                let builtin = catalog.get(id).ok_or(RuntimeError::Unreachable {
                    what: "built-in from another catalog",
                })?;
                let found = self.values.count_and_unlock()?;
                if let BuiltinArity::Fixed(expected) = builtin.arity {
                    if expected != found {
                        return Err(RuntimeError::ArityMismatch { expected, found });
                    }
                }
                self.nargs = found;
                (builtin.body)(self)?;
                Ok(Step::Continue(next))
            }
            Value::Stream(stream) => {
                self.values.count_and_unlock()?;
                let item = stream.borrow_mut().advance();
                let item = item.ok_or(RuntimeError::StreamExhausted)?;
                self.push(item);
                Ok(Step::Continue(next))
            }
            other => Err(RuntimeError::NotCallable {
                found: other.show(),
            }),
        }
    }

    fn return_from_call(&mut self) -> Result<Step, RuntimeError> {
        if self.calls.lock_count() == 0 {
            return Ok(Step::Halt);
        }
        self.calls.clear_and_unlock()?;
        self.calls.pop()?;
        match self.calls.pop()? {
            Slot::Return(next) => Ok(Step::Continue(next)),
            Slot::Local(_) | Slot::Alt(_) => Err(RuntimeError::Unreachable {
                what: "frame without return linkage",
            }),
        }
    }

    /// `and` runs `rhs` when the boolean on top is true, `or` when false.
    /// Otherwise the boolean stays as the result.
    fn short_circuit(&mut self, sense: bool, rhs: NodeId, next: NodeId) -> Result<Step, RuntimeError> {
        if self.peek_bool()? == sense {
            self.values.pop()?;
            Ok(Step::Continue(rhs))
        } else {
            Ok(Step::Continue(next))
        }
    }

    fn iterate_slot(
        &mut self,
        slot: usize,
        on_value: NodeId,
        on_exhausted: NodeId,
    ) -> Result<Step, RuntimeError> {
        match self.local(slot)? {
            Value::Stream(stream) => {
                let item = stream.borrow_mut().advance();
                match item {
                    Some(value) => {
                        self.push(value);
                        Ok(Step::Continue(on_value))
                    }
                    None => Ok(Step::Continue(on_exhausted)),
                }
            }
            Value::Function(_) => Err(RuntimeError::Unimplemented {
                what: "iterating over a function".into(),
            }),
            other => Err(RuntimeError::NotIterable {
                found: other.show(),
            }),
        }
    }
}
