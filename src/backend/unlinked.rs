//! Fail-loud stand-in used when no native library is linked.
//!
//! Every operation fails with the linking diagnostic. Nothing here ever
//! produces a value, so misconfigured builds cannot be mistaken for working
//! ones.

use crate::core::contract::Capabilities;
use crate::core::error::{BridgeError, BridgeResult, LinkingDiagnostic};

/// Backend that rejects every call with [`BridgeError::LinkingUnavailable`].
#[derive(Debug, Clone)]
pub struct UnlinkedBackend {
    diagnostic: LinkingDiagnostic,
}

impl UnlinkedBackend {
    pub fn new(capability: impl Into<String>) -> Self {
        UnlinkedBackend {
            diagnostic: LinkingDiagnostic::new(capability),
        }
    }

    pub fn capability(&self) -> &str {
        &self.diagnostic.capability
    }

    fn unavailable<T>(&self) -> BridgeResult<T> {
        Err(BridgeError::LinkingUnavailable(self.diagnostic.clone()))
    }
}

impl Capabilities for UnlinkedBackend {
    fn hello_world(&self) -> BridgeResult<String> {
        self.unavailable()
    }

    fn add_numbers(&self, _a: i64, _b: i64) -> BridgeResult<i64> {
        self.unavailable()
    }

    fn system_info(&self) -> BridgeResult<String> {
        self.unavailable()
    }

    fn fibonacci(&self, _n: i64) -> BridgeResult<i64> {
        self.unavailable()
    }

    fn is_prime(&self, _n: i64) -> BridgeResult<bool> {
        self.unavailable()
    }

    fn factorize(&self, _n: i64) -> BridgeResult<Vec<i64>> {
        self.unavailable()
    }

    fn create_user(&self, _id: i64, _name: &str, _email: &str) -> BridgeResult<String> {
        self.unavailable()
    }

    fn validate_email(&self, _email: &str) -> BridgeResult<bool> {
        self.unavailable()
    }

    fn version(&self) -> BridgeResult<String> {
        self.unavailable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_linking<T: std::fmt::Debug>(result: BridgeResult<T>) {
        match result {
            Err(BridgeError::LinkingUnavailable(diag)) => assert_eq!(diag.capability, "corebridge"),
            other => panic!("expected linking diagnostic, got {:?}", other),
        }
    }

    #[test]
    fn test_every_operation_fails_loudly() {
        let backend = UnlinkedBackend::new("corebridge");
        assert_linking(backend.hello_world());
        assert_linking(backend.add_numbers(2, 40));
        assert_linking(backend.system_info());
        assert_linking(backend.fibonacci(10));
        assert_linking(backend.is_prime(13));
        assert_linking(backend.factorize(12));
        assert_linking(backend.create_user(1, "John Doe", "john@example.com"));
        assert_linking(backend.validate_email("test@example.com"));
        assert_linking(backend.version());
    }

    #[test]
    fn test_invalid_input_still_reports_linking() {
        // Domain errors must not mask the missing library.
        let backend = UnlinkedBackend::new("corebridge");
        assert_linking(backend.fibonacci(-1));
        assert_linking(backend.factorize(1));
    }
}
