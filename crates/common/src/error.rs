//! Errors raised while reading a program bundle.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that occur while loading or decoding a bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The bundle file could not be read.
    #[error("cannot read bundle {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bundle text is not a valid tree encoding.
    #[error("malformed bundle: {0}")]
    Json(#[from] serde_json::Error),

    /// An arity annotation did not have the form `N` or `N+`.
    #[error("invalid arity annotation {0:?}")]
    InvalidArity(String),

    /// No entry point was named and none could be inferred.
    #[error("no entry point: {0}")]
    NoEntryPoint(String),
}
