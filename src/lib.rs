//! capbridge - one capability contract, served by a native library or a
//! deterministic in-process fallback.
//!
//! This crate provides the contract, its backends, the one-time backend
//! selection and the facade application code calls.

pub mod backend;
pub mod bridge;
pub mod core;
pub mod ops;
pub mod util;

/// Test doubles for capbridge unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides a fake native library and a counting probe.
#[cfg(test)]
pub mod test_support;

pub use crate::backend::{BackendHandle, BackendKind, BackendMode, BackendSelector, SelectorSettings};
pub use crate::bridge::Bridge;
pub use crate::core::{BridgeError, BridgeResult, Capabilities, Operation};
