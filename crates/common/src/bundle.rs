//! Program bundles: the named top-level bindings of a compiled program.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::codelet::Codelet;
use crate::error::BundleError;

/// A loaded program: bindings in declaration order plus the names the
/// front end annotated as commands (entry points) and unit tests.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Bundle {
    pub bindings: IndexMap<String, Codelet>,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub unittests: Vec<String>,
}

impl Bundle {
    /// Parse a bundle document.
    pub fn from_json(text: &str) -> Result<Self, BundleError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and decode a bundle file.
    pub fn load(path: &Path) -> Result<Self, BundleError> {
        let text = std::fs::read_to_string(path).map_err(|source| BundleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// The entry point to run when the host did not name one: the single
    /// binding annotated as a command.
    pub fn default_entry_point(&self) -> Result<&str, BundleError> {
        match self.commands.as_slice() {
            [only] => Ok(only.as_str()),
            [] => Err(BundleError::NoEntryPoint(
                "the bundle declares no commands".into(),
            )),
            many => Err(BundleError::NoEntryPoint(format!(
                "the bundle declares {} commands, choose one with --entry-point",
                many.len()
            ))),
        }
    }
}
