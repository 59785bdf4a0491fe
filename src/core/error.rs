//! Errors raised across the capability contract.
//!
//! Every failure is returned synchronously from the call that caused it.
//! Nothing here logs in place of returning.

use std::fmt;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::contract::Operation;
use crate::util::diagnostic::Diagnostic;

/// Result alias used by every contract operation.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Failure of a single contract call.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum BridgeError {
    /// No native backend is linked and fail-loud mode is configured.
    #[error("{0}")]
    #[diagnostic(code(capbridge::linking::unavailable))]
    LinkingUnavailable(LinkingDiagnostic),

    /// The argument lies outside the operation's documented domain.
    #[error("invalid argument for `{operation}`: {reason}")]
    #[diagnostic(code(capbridge::contract::invalid_argument))]
    InvalidArgument {
        operation: Operation,
        reason: String,
    },

    /// The native library returned something the adapter cannot translate.
    #[error("native call `{symbol}` failed: {reason}")]
    #[diagnostic(
        code(capbridge::native::call_failed),
        help("The native library may be built against a different ABI; rebuild it")
    )]
    NativeCall { symbol: String, reason: String },
}

impl BridgeError {
    /// Build an argument error for `operation`.
    pub fn invalid_argument(operation: Operation, reason: impl Into<String>) -> Self {
        BridgeError::InvalidArgument {
            operation,
            reason: reason.into(),
        }
    }

    /// Build a native call error for `symbol`.
    pub fn native_call(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        BridgeError::NativeCall {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Short stable name of the error variant.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::LinkingUnavailable(_) => "linking-unavailable",
            BridgeError::InvalidArgument { .. } => "invalid-argument",
            BridgeError::NativeCall { .. } => "native-call",
        }
    }

    /// Whether this error is the linking diagnostic.
    pub fn is_linking_unavailable(&self) -> bool {
        matches!(self, BridgeError::LinkingUnavailable(_))
    }
}

/// Remediation raised when the native capability is not linked.
///
/// The rendered text is stable so callers and tests can match on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkingDiagnostic {
    /// Capability (library base name) that could not be found.
    pub capability: String,
}

impl LinkingDiagnostic {
    /// Create a diagnostic for the named capability.
    pub fn new(capability: impl Into<String>) -> Self {
        LinkingDiagnostic {
            capability: capability.into(),
        }
    }

    /// Structured form of the remediation text.
    pub fn diagnostic(&self) -> Diagnostic {
        let cap = &self.capability;
        Diagnostic::error(format!(
            "native capability `{cap}` is not linked into this process"
        ))
        .with_context(format!(
            "no library providing `{cap}` was registered or found when the backend was resolved"
        ))
        .with_suggestion(format!(
            "Rebuild the host application so the `{cap}` native library is compiled and linked"
        ))
        .with_suggestion(
            "Point `native.library` (or CAPBRIDGE_NATIVE_LIB) at the built library and restart",
        )
        .with_suggestion(
            "If `native.enabled = false` is set, linking is disabled by design in this development mode; \
             set `backend.mode = \"fallback\"` to use the software backend instead",
        )
    }

    /// Rendered multi-line remediation text.
    pub fn message(&self) -> String {
        self.diagnostic().format(false)
    }
}

impl fmt::Display for LinkingDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message().trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linking_message_is_stable() {
        let diag = LinkingDiagnostic::new("corebridge");
        let expected = "\
error: native capability `corebridge` is not linked into this process
  → no library providing `corebridge` was registered or found when the backend was resolved

help: consider:
  1. Rebuild the host application so the `corebridge` native library is compiled and linked
  2. Point `native.library` (or CAPBRIDGE_NATIVE_LIB) at the built library and restart
  3. If `native.enabled = false` is set, linking is disabled by design in this development mode; \
set `backend.mode = \"fallback\"` to use the software backend instead
";
        assert_eq!(diag.message(), expected);
    }

    #[test]
    fn test_linking_error_display() {
        let err = BridgeError::LinkingUnavailable(LinkingDiagnostic::new("corebridge"));
        let text = err.to_string();
        assert!(text.starts_with("error: native capability `corebridge` is not linked"));
        assert!(text.ends_with("to use the software backend instead"));
        assert!(err.is_linking_unavailable());
    }

    #[test]
    fn test_invalid_argument_display() {
        let err = BridgeError::invalid_argument(Operation::Factorize, "n must be at least 2, got 1");
        assert_eq!(
            err.to_string(),
            "invalid argument for `factorize`: n must be at least 2, got 1"
        );
        assert!(!err.is_linking_unavailable());
        assert_eq!(err.kind(), "invalid-argument");
    }
}
