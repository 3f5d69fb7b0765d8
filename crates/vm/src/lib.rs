//! Nutmeg engine: executes woven instruction graphs.
//!
//! The engine holds:
//! - a [`Graph`] of instruction nodes ([`Runlet`]s) produced by the weaver
//! - a checked layered value stack and an unchecked layered call stack
//! - the table of [`Globals`] and the built-in [`Catalog`]
//!
//! Execution is a trampoline: each node returns its successor, so program
//! recursion never grows the host stack.
//!
//! # Usage
//!
//! ```
//! use nutmeg_vm::{Catalog, Engine, Runlet, Value};
//!
//! let mut engine = Engine::new(Catalog::standard());
//! let graph = engine.graph_mut();
//! let halt = graph.add(Runlet::Halt { print: false });
//! let push = graph.add(Runlet::PushConstant { value: Value::Int(42), next: halt });
//!
//! engine.run(push).unwrap();
//! assert_eq!(engine.machine().values(), vec![Value::Int(42)]);
//! ```

pub mod builtins;
pub mod dot;
pub mod error;
pub mod execute;
pub mod globals;
pub mod graph;
pub mod machine;
pub mod stack;
pub mod stream;
pub mod value;

pub use builtins::{Builtin, BuiltinArity, BuiltinFn, BuiltinId, Catalog};
pub use error::RuntimeError;
pub use execute::{Engine, Step, WeavingParts};
pub use globals::{GlobalId, Globals};
pub use graph::{Graph, NodeId, Runlet};
pub use machine::{EngineOptions, Machine, Slot};
pub use stack::{CheckedLayeredStack, LayeredStack, UncheckedLayeredStack};
pub use stream::{Range, Stream};
pub use value::Value;
