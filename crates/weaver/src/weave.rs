//! Continuation-passing weaving of expression trees.
//!
//! `weave(node, k)` returns the entry of code that evaluates `node`,
//! leaves its values on the value stack and then continues at `k`. Nodes
//! are built back to front, so every successor exists before the node that
//! refers to it (loop heads use graph placeholders).

use nutmeg_common::{Codelet, Node, RefType, Scope};
use nutmeg_vm::{BuiltinArity, BuiltinId, Catalog, Globals, Graph, NodeId, Runlet, Value, WeavingParts};
use tracing::trace;

use crate::error::WeaveError;

pub struct Weaver<'a> {
    pub(crate) graph: &'a mut Graph,
    pub(crate) globals: &'a Globals,
    pub(crate) catalog: &'a Catalog,
}

impl<'a> Weaver<'a> {
    /// A weaver appending to the engine's graph.
    pub fn new(parts: WeavingParts<'a>) -> Self {
        Weaver {
            graph: parts.graph,
            globals: parts.globals,
            catalog: parts.catalog,
        }
    }

    pub(crate) fn add(&mut self, runlet: Runlet) -> NodeId {
        self.graph.add(runlet)
    }

    /// Weave `codelet` so that it continues at `k`.
    pub fn weave(&mut self, codelet: &Codelet, k: NodeId) -> Result<NodeId, WeaveError> {
        trace!(kind = codelet.kind(), "weave");
        match &codelet.node {
            Node::String { value } => Ok(self.push_constant(Value::from(value.as_str()), k)),
            Node::Int { value } => {
                let n = value
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| WeaveError::InvalidLiteral {
                        kind: "int",
                        text: value.clone(),
                    })?;
                Ok(self.push_constant(Value::Int(n), k))
            }
            Node::Char { value } => {
                let mut chars = value.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Ok(self.push_constant(Value::Char(ch), k)),
                    _ => Err(WeaveError::InvalidLiteral {
                        kind: "char",
                        text: value.clone(),
                    }),
                }
            }
            Node::Bool { value } => Ok(self.push_constant(Value::Bool(*value), k)),
            Node::Id {
                name,
                reftype,
                scope,
                slot,
            } => self.weave_identifier(name, *reftype, *scope, *slot, k),
            Node::Lambda {
                nargs,
                nlocals,
                body,
            } => self.weave_function(*nargs, *nlocals, body, Some(k)),
            Node::Call {
                function,
                arguments,
            } => {
                let call = self.add(Runlet::CallDynamic { next: k });
                let callee = self.weave1(function, call)?;
                let args = self.weave(arguments, callee)?;
                Ok(self.add(Runlet::Lock { next: args }))
            }
            Node::Seq { body } => body
                .iter()
                .rev()
                .try_fold(k, |next, part| self.weave(part, next)),
            Node::If {
                test,
                then,
                otherwise,
            } => {
                let then = self.weave(then, k)?;
                let otherwise = self.weave(otherwise, k)?;
                let fork = self.add(Runlet::Fork { then, otherwise });
                self.weave(test, fork)
            }
            Node::And { lhs, rhs } => {
                let rhs = self.weave(rhs, k)?;
                let and = self.add(Runlet::And { rhs, next: k });
                self.weave(lhs, and)
            }
            Node::Or { lhs, rhs } => {
                let rhs = self.weave(rhs, k)?;
                let or = self.add(Runlet::Or { rhs, next: k });
                self.weave(lhs, or)
            }
            Node::Syscall { name, arguments } => self.weave_syscall(name, arguments, k),
            Node::Sysfn { name } => {
                let builtin = self.resolve_builtin(name)?;
                Ok(self.push_constant(Value::Builtin(builtin), k))
            }
            Node::Binding { lhs, rhs } | Node::Assign { lhs, rhs } => {
                let slot = local_slot(lhs)?;
                let store = self.add(Runlet::PopIntoLocal { slot, next: k });
                self.weave1(rhs, store)
            }
            Node::For { query } => self.weave_for(query, k),
            Node::In { .. }
            | Node::Do { .. }
            | Node::Nonstop
            | Node::Wuntil { .. }
            | Node::Afterwards { .. } => Err(WeaveError::Unimplemented {
                what: format!("{} query outside a for loop", codelet.kind()),
            }),
        }
    }

    /// Weave `codelet` in a context that needs exactly one value.
    pub fn weave1(&mut self, codelet: &Codelet, k: NodeId) -> Result<NodeId, WeaveError> {
        if codelet.arity().is_exactly(1) {
            return self.weave(codelet, k);
        }
        let single = self.add(Runlet::UnlockSingle { next: k });
        let inner = self.weave(codelet, single)?;
        Ok(self.add(Runlet::Lock { next: inner }))
    }

    /// Weave a function body ending in `Return` and wrap it in a template.
    /// `k` is the continuation when the template is evaluated as an
    /// expression; top-level bindings have none.
    pub fn weave_function(
        &mut self,
        nargs: usize,
        nlocals: usize,
        body: &Codelet,
        k: Option<NodeId>,
    ) -> Result<NodeId, WeaveError> {
        let ret = self.add(Runlet::Return);
        let entry = self.weave(body, ret)?;
        let entry = self.graph.follow(entry);
        Ok(self.add(Runlet::FunctionTemplate {
            arity: nargs,
            locals: nlocals,
            entry,
            next: k,
        }))
    }

    /// Catalog entry for `name` or any of its synonyms.
    pub fn resolve_builtin(&self, name: &str) -> Result<BuiltinId, WeaveError> {
        self.catalog
            .resolve(name)
            .ok_or_else(|| WeaveError::UnknownSystemFunction {
                name: name.to_string(),
            })
    }

    fn push_constant(&mut self, value: Value, k: NodeId) -> NodeId {
        self.add(Runlet::PushConstant { value, next: k })
    }

    fn weave_identifier(
        &mut self,
        name: &str,
        reftype: RefType,
        scope: Scope,
        slot: Option<usize>,
        k: NodeId,
    ) -> Result<NodeId, WeaveError> {
        if reftype != RefType::Get {
            return Err(WeaveError::Unimplemented {
                what: format!("assignment through identifier {name}"),
            });
        }
        match (scope, slot) {
            (Scope::Global, _) => {
                let global = self
                    .globals
                    .lookup(name)
                    .ok_or_else(|| WeaveError::UnknownIdentifier {
                        name: name.to_string(),
                    })?;
                Ok(self.add(Runlet::PushGlobal { global, next: k }))
            }
            (Scope::Local, Some(slot)) => Ok(self.add(Runlet::PushLocal { slot, next: k })),
            (Scope::Local, None) => Err(WeaveError::Unimplemented {
                what: format!("local {name} without a slot"),
            }),
        }
    }

    /// Built-in bodies never manage locks: fixed-arity arguments are
    /// counted before the body runs, variadic ones are counted into the
    /// argument register.
    fn weave_syscall(
        &mut self,
        name: &str,
        arguments: &Codelet,
        k: NodeId,
    ) -> Result<NodeId, WeaveError> {
        let id = self.resolve_builtin(name)?;
        let arity = self
            .catalog
            .get(id)
            .map(|b| b.arity)
            .ok_or_else(|| WeaveError::UnknownSystemFunction {
                name: name.to_string(),
            })?;
        let body = self.add(Runlet::Builtin { builtin: id, next: k });
        let unlock = match arity {
            BuiltinArity::Fixed(n) if arguments.arity().is_exactly(n) => {
                return self.weave(arguments, body);
            }
            BuiltinArity::Fixed(n) => self.add(Runlet::UnlockChecked {
                expected: n,
                next: body,
            }),
            BuiltinArity::Variadic => self.add(Runlet::CountAndUnlock { next: body }),
        };
        let args = self.weave(arguments, unlock)?;
        Ok(self.add(Runlet::Lock { next: args }))
    }
}

/// Slot of a local variable on the left of a binding.
pub(crate) fn local_slot(codelet: &Codelet) -> Result<usize, WeaveError> {
    match &codelet.node {
        Node::Id {
            scope: Scope::Local,
            slot: Some(slot),
            ..
        } => Ok(*slot),
        _ => Err(WeaveError::NotASimpleVariable {
            kind: codelet.kind(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutmeg_common::Arity;
    use nutmeg_vm::{Catalog, Engine};

    fn engine() -> Engine {
        Engine::new(Catalog::standard())
    }

    #[test]
    fn literal_is_a_single_push() {
        let mut engine = engine();
        let mut weaver = Weaver::new(engine.weaving_parts());
        let end = weaver.add(Runlet::Halt { print: false });
        let entry = weaver.weave(&Codelet::int(5), end).unwrap();
        assert_eq!(
            weaver.graph[entry],
            Runlet::PushConstant {
                value: Value::Int(5),
                next: end
            }
        );
    }

    #[test]
    fn empty_seq_is_the_continuation() {
        let mut engine = engine();
        let mut weaver = Weaver::new(engine.weaving_parts());
        let end = weaver.add(Runlet::Halt { print: false });
        assert_eq!(weaver.weave(&Codelet::seq(vec![]), end), Ok(end));
    }

    #[test]
    fn bad_int_literal() {
        let mut engine = engine();
        let mut weaver = Weaver::new(engine.weaving_parts());
        let end = weaver.add(Runlet::Halt { print: false });
        let bad = Codelet::new(Node::Int {
            value: "12a".into(),
        });
        assert_eq!(
            weaver.weave(&bad, end),
            Err(WeaveError::InvalidLiteral {
                kind: "int",
                text: "12a".into()
            })
        );
    }

    #[test]
    fn exact_arguments_skip_the_lock() {
        let mut engine = engine();
        let mut weaver = Weaver::new(engine.weaving_parts());
        let end = weaver.add(Runlet::Halt { print: false });
        let args = Codelet::seq(vec![Codelet::int(1), Codelet::int(2)]).with_arity(Arity::exactly(2));
        let entry = weaver.weave(&Codelet::syscall("+", args), end).unwrap();
        assert!(matches!(weaver.graph[entry], Runlet::PushConstant { .. }));
    }

    #[test]
    fn inexact_arguments_are_checked() {
        let mut engine = engine();
        let mut weaver = Weaver::new(engine.weaving_parts());
        let end = weaver.add(Runlet::Halt { print: false });
        let args = Codelet::seq(vec![Codelet::int(1), Codelet::int(2)]);
        let entry = weaver.weave(&Codelet::syscall("+", args), end).unwrap();
        let Runlet::Lock { next } = weaver.graph[entry] else {
            panic!("expected a lock");
        };
        let reachable = weaver.graph.reachable(next);
        assert!(reachable
            .iter()
            .any(|id| matches!(weaver.graph[*id], Runlet::UnlockChecked { expected: 2, .. })));
    }

    #[test]
    fn variadic_arguments_are_counted() {
        let mut engine = engine();
        let mut weaver = Weaver::new(engine.weaving_parts());
        let end = weaver.add(Runlet::Halt { print: false });
        let entry = weaver
            .weave(&Codelet::syscall("sum", Codelet::int(1)), end)
            .unwrap();
        let reachable = weaver.graph.reachable(entry);
        assert!(reachable
            .iter()
            .any(|id| matches!(weaver.graph[*id], Runlet::CountAndUnlock { .. })));
    }

    #[test]
    fn unknown_builtin_fails_at_weave_time() {
        let mut engine = engine();
        let mut weaver = Weaver::new(engine.weaving_parts());
        let end = weaver.add(Runlet::Halt { print: false });
        assert_eq!(
            weaver.weave(&Codelet::syscall("frob", Codelet::seq(vec![])), end),
            Err(WeaveError::UnknownSystemFunction {
                name: "frob".into()
            })
        );
    }

    #[test]
    fn unknown_global_fails_at_weave_time() {
        let mut engine = engine();
        let mut weaver = Weaver::new(engine.weaving_parts());
        let end = weaver.add(Runlet::Halt { print: false });
        assert_eq!(
            weaver.weave(&Codelet::global("nowhere"), end),
            Err(WeaveError::UnknownIdentifier {
                name: "nowhere".into()
            })
        );
    }

    #[test]
    fn binding_needs_a_local() {
        let mut engine = engine();
        let mut weaver = Weaver::new(engine.weaving_parts());
        let end = weaver.add(Runlet::Halt { print: false });
        let binding = Codelet::new(Node::Binding {
            lhs: Box::new(Codelet::int(1)),
            rhs: Box::new(Codelet::int(2)),
        });
        assert_eq!(
            weaver.weave(&binding, end),
            Err(WeaveError::NotASimpleVariable { kind: "int" })
        );
    }

    #[test]
    fn set_reference_is_unimplemented() {
        let mut engine = engine();
        let mut weaver = Weaver::new(engine.weaving_parts());
        let end = weaver.add(Runlet::Halt { print: false });
        let set = Codelet::new(Node::Id {
            name: "x".into(),
            reftype: RefType::Set,
            scope: Scope::Local,
            slot: Some(0),
        });
        assert!(matches!(
            weaver.weave(&set, end),
            Err(WeaveError::Unimplemented { .. })
        ));
    }

    #[test]
    fn bare_query_is_unimplemented() {
        let mut engine = engine();
        let mut weaver = Weaver::new(engine.weaving_parts());
        let end = weaver.add(Runlet::Halt { print: false });
        assert!(matches!(
            weaver.weave(&Codelet::new(Node::Nonstop), end),
            Err(WeaveError::Unimplemented { .. })
        ));
    }
}
