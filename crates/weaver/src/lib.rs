//! Nutmeg weaver: compiles program trees into instruction graphs.
//!
//! Weaving is continuation passing. Each tree node is compiled against the
//! node that runs after it, so a whole expression becomes a chain of
//! [`Runlet`](nutmeg_vm::Runlet)s ending at its continuation. Loops close
//! their cycle through a graph placeholder that is resolved once the loop
//! head exists.
//!
//! # Usage
//!
//! ```
//! use nutmeg_common::{Arity, Codelet};
//! use nutmeg_vm::{Catalog, Engine, Value};
//! use nutmeg_weaver::evaluate;
//!
//! let mut engine = Engine::new(Catalog::standard());
//! let args = Codelet::seq(vec![Codelet::int(1), Codelet::int(2)]).with_arity(Arity::exactly(2));
//! let sum = Codelet::syscall("+", args);
//!
//! assert_eq!(evaluate(&mut engine, &sum).unwrap(), vec![Value::Int(3)]);
//! ```

pub mod error;
pub mod program;

mod loops;
mod weave;

pub use error::WeaveError;
pub use program::{evaluate, load_bundle};
pub use weave::Weaver;
