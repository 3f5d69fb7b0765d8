//! Nutmeg common types: the tree-node model that the front end produces
//! and the runner consumes.
//!
//! This crate provides:
//!
//! - [`Codelet`] / [`Node`]: one node of the compiled program tree
//! - [`Arity`]: the number of values an expression may leave behind
//! - [`Bundle`]: the set of named top-level bindings plus annotations
//! - [`BundleError`]: errors from reading or decoding a bundle
//!
//! Bundles are JSON documents. Every tree node carries a `"kind"` tag and
//! may carry an `"arity"` string such as `"1"` or `"2+"`.

pub mod arity;
pub mod bundle;
pub mod codelet;
pub mod error;

pub use arity::Arity;
pub use bundle::Bundle;
pub use codelet::{Codelet, Node, RefType, Scope};
pub use error::BundleError;
