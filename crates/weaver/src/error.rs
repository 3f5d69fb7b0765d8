//! Errors raised while weaving or loading a program.

use nutmeg_vm::RuntimeError;
use thiserror::Error;

/// Errors produced while turning program trees into instruction graphs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeaveError {
    /// A global identifier that was never declared.
    #[error("unknown identifier")]
    UnknownIdentifier { name: String },

    /// A built-in name missing from the catalog.
    #[error("cannot resolve the following system function")]
    UnknownSystemFunction { name: String },

    /// A node used as a loop query that is not one.
    #[error("cannot iterate over a {kind} node")]
    NotIterable { kind: &'static str },

    /// A recognised node the weaver does not support here.
    #[error("not implemented: {what}")]
    Unimplemented { what: String },

    /// A literal whose text does not parse.
    #[error("invalid {kind} literal")]
    InvalidLiteral { kind: &'static str, text: String },

    /// The left-hand side of a binding is not a local variable.
    #[error("left hand side of binding not a simple variable")]
    NotASimpleVariable { kind: &'static str },

    /// A loop whose body contains no instructions.
    #[error("loop has no instructions to repeat")]
    EmptyLoop,

    /// An initialiser failed while the program was loading.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl WeaveError {
    /// Key/value details printed beneath the message.
    pub fn culprits(&self) -> Vec<(&'static str, String)> {
        match self {
            WeaveError::UnknownIdentifier { name }
            | WeaveError::UnknownSystemFunction { name } => vec![("Identifier", name.clone())],
            WeaveError::NotIterable { kind } | WeaveError::NotASimpleVariable { kind } => {
                vec![("Kind", (*kind).to_string())]
            }
            WeaveError::InvalidLiteral { text, .. } => vec![("Literal", text.clone())],
            WeaveError::EmptyLoop => vec![("Hint", "a nonstop loop needs a body".to_string())],
            WeaveError::Runtime(err) => err.culprits(),
            WeaveError::Unimplemented { .. } => Vec::new(),
        }
    }
}
