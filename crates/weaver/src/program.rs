//! Loading a bundle into an engine.
//!
//! Loading happens in three passes over the bindings, in bundle order:
//!
//! 1. every name is declared, so any binding may refer to any other
//! 2. function literals and built-in references are woven and assigned
//! 3. the remaining bindings are initialised by running them to completion
//!
//! An initialiser that reads a global not yet assigned fails with
//! `UninitialisedGlobal`; functions are assigned before any initialiser
//! runs, so they may be called freely.

use nutmeg_common::{Bundle, Codelet, Node};
use nutmeg_vm::{Engine, GlobalId, NodeId, Runlet, Value};
use tracing::debug;

use crate::error::WeaveError;
use crate::weave::Weaver;

/// Declare, weave and initialise every binding of `bundle`.
pub fn load_bundle(engine: &mut Engine, bundle: &Bundle) -> Result<(), WeaveError> {
    let ids: Vec<GlobalId> = bundle
        .bindings
        .keys()
        .map(|name| engine.globals_mut().declare(name))
        .collect();

    let mut pending = Vec::new();
    for ((name, codelet), id) in bundle.bindings.iter().zip(ids) {
        match bind(engine, codelet)? {
            Some(value) => {
                debug!(name = name.as_str(), kind = codelet.kind(), "bind");
                engine.globals_mut().assign(id, value)?;
            }
            None => pending.push((name, codelet, id)),
        }
    }

    for (name, codelet, id) in pending {
        debug!(name = name.as_str(), "initialise");
        initialise(engine, codelet, id)?;
        debug!(name = name.as_str(), "initialised");
    }
    Ok(())
}

/// The value of a binding that needs no running: a woven function or a
/// built-in. Anything else is left for its initialiser.
fn bind(engine: &mut Engine, codelet: &Codelet) -> Result<Option<Value>, WeaveError> {
    match &codelet.node {
        Node::Lambda {
            nargs,
            nlocals,
            body,
        } => {
            let mut weaver = Weaver::new(engine.weaving_parts());
            let function = weaver.weave_function(*nargs, *nlocals, body, None)?;
            Ok(Some(Value::Function(function)))
        }
        Node::Sysfn { name } => {
            let weaver = Weaver::new(engine.weaving_parts());
            Ok(Some(Value::Builtin(weaver.resolve_builtin(name)?)))
        }
        _ => Ok(None),
    }
}

/// Run `codelet` as the body of a zero-argument function and store its
/// single result in `global`.
fn initialise(engine: &mut Engine, codelet: &Codelet, global: GlobalId) -> Result<(), WeaveError> {
    let function = wrap(engine, codelet)?;
    engine.run_scratch(|graph| {
        let halt = graph.add(Runlet::Halt { print: false });
        let store = graph.add(Runlet::PopIntoGlobal { global, next: halt });
        let single = graph.add(Runlet::UnlockSingle { next: store });
        let call = graph.add(Runlet::Call {
            function,
            next: single,
        });
        let args = graph.add(Runlet::Lock { next: call });
        graph.add(Runlet::Lock { next: args })
    })?;
    engine.reset();
    Ok(())
}

/// Weave and run a free-standing expression, returning the values it
/// leaves, bottom first. Globals it refers to must already be loaded.
pub fn evaluate(engine: &mut Engine, codelet: &Codelet) -> Result<Vec<Value>, WeaveError> {
    let function = wrap(engine, codelet)?;
    Ok(engine.start_function(function, &[], false)?)
}

fn wrap(engine: &mut Engine, codelet: &Codelet) -> Result<NodeId, WeaveError> {
    let mut weaver = Weaver::new(engine.weaving_parts());
    weaver.weave_function(0, codelet.local_slot_count(), codelet, None)
}
