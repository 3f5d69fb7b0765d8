//! Runtime errors for the Nutmeg engine.
//!
//! Every error unwinds the trampoline to its caller. Normal termination is
//! not an error: halting nodes return [`Step::Halt`](crate::execute::Step).
//! The host prints the message and then each culprit as ` Key: Value`.

use thiserror::Error;

/// Errors that occur while executing an instruction graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Argument count disagrees with the callee's declared parameter count.
    #[error("mismatch in the number of arguments to the number of parameters")]
    ArityMismatch { expected: usize, found: usize },

    /// Pop or peek below the current layer boundary.
    #[error("stack underflow")]
    StackUnderflow,

    /// Unlock with no outstanding lock.
    #[error("unlock without a matching lock")]
    UnlockWithoutLock,

    /// Indexed access outside the current layer.
    #[error("slot {index} out of range (layer size {size})")]
    SlotOutOfRange { index: usize, size: usize },

    /// A single-valued context produced the wrong number of values.
    #[error("expression produced {found} values where {expected} was required")]
    WrongItemCount { expected: usize, found: usize },

    /// A value that cannot be streamed was used as a loop source.
    #[error("value is not iterable")]
    NotIterable { found: String },

    /// An iterator was called after it ran out.
    #[error("stream exhausted")]
    StreamExhausted,

    /// A value that is neither a function nor an iterator was called.
    #[error("value is not callable")]
    NotCallable { found: String },

    /// A value of the wrong kind reached an operation.
    #[error("type mismatch: expected {expected}")]
    TypeMismatch { expected: &'static str, found: String },

    /// A built-in assertion failed.
    #[error("assertion failed")]
    AssertionFailed {
        unit: String,
        position: String,
        details: Vec<(&'static str, String)>,
    },

    /// A global was read before its initialiser ran.
    #[error("uninitialised global variable")]
    UninitialisedGlobal { name: String },

    /// A global was written twice.
    #[error("global variable already assigned")]
    GlobalAlreadyAssigned { name: String },

    /// No global by this name exists.
    #[error("unknown identifier")]
    UnknownIdentifier { name: String },

    /// A recognised construct the engine does not support.
    #[error("not implemented: {what}")]
    Unimplemented { what: String },

    /// Execution reached a state the weaver never produces.
    #[error("internal error: {what}")]
    Unreachable { what: &'static str },

    /// A range could not be constructed.
    #[error("invalid range: {reason}")]
    InvalidRange { reason: &'static str },

    /// A count does not fit in an integer value.
    #[error("integer overflow")]
    IntOverflow { found: String },

    /// Writing to the engine's output sink failed.
    #[error("cannot write output: {message}")]
    Output { message: String },
}

impl RuntimeError {
    /// Key/value details printed beneath the message.
    pub fn culprits(&self) -> Vec<(&'static str, String)> {
        match self {
            RuntimeError::ArityMismatch { expected, found }
            | RuntimeError::WrongItemCount { expected, found } => vec![
                ("Expected", expected.to_string()),
                ("Found", found.to_string()),
            ],
            RuntimeError::SlotOutOfRange { index, size } => {
                vec![("Index", index.to_string()), ("Size", size.to_string())]
            }
            RuntimeError::NotIterable { found }
            | RuntimeError::NotCallable { found }
            | RuntimeError::IntOverflow { found } => vec![("Value", found.clone())],
            RuntimeError::TypeMismatch { expected, found } => {
                vec![("Expected", (*expected).to_string()), ("Found", found.clone())]
            }
            RuntimeError::AssertionFailed {
                unit,
                position,
                details,
            } => {
                let mut culprits: Vec<_> = [("Unit", unit), ("Position", position)]
                    .into_iter()
                    .filter(|(_, v)| !v.is_empty())
                    .map(|(k, v)| (k, v.clone()))
                    .collect();
                culprits.extend(details.iter().cloned());
                culprits
            }
            RuntimeError::UninitialisedGlobal { name }
            | RuntimeError::GlobalAlreadyAssigned { name }
            | RuntimeError::UnknownIdentifier { name } => vec![("Identifier", name.clone())],
            _ => Vec::new(),
        }
    }
}

impl From<std::io::Error> for RuntimeError {
    fn from(err: std::io::Error) -> Self {
        RuntimeError::Output {
            message: err.to_string(),
        }
    }
}
