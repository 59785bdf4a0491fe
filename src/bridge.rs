//! Consumer facade.
//!
//! Application code talks to [`Bridge`] and never to a backend directly. The
//! facade captures the resolved handle once and forwards each call unchanged,
//! so callers see exactly the values and errors the bound backend produces.

use std::sync::Arc;

use crate::backend::selector::{BackendHandle, BackendKind, BackendSelector};
use crate::core::contract::Capabilities;
use crate::core::error::BridgeResult;
use crate::core::version::VersionDescriptor;

/// Entry point for every contract operation.
#[derive(Clone)]
pub struct Bridge {
    handle: BackendHandle,
}

impl Bridge {
    /// Wrap an already resolved handle.
    pub fn new(handle: BackendHandle) -> Self {
        Bridge { handle }
    }

    /// Resolve `selector` (first access only) and wrap its handle.
    pub fn connect(selector: &BackendSelector) -> Self {
        Self::new(selector.resolve())
    }

    /// Facade over the process-wide selector.
    pub fn global() -> Self {
        Self::connect(BackendSelector::global())
    }

    pub fn kind(&self) -> BackendKind {
        self.handle.kind
    }

    pub fn origin(&self) -> Option<&str> {
        self.handle.origin.as_deref()
    }

    pub fn handle(&self) -> &BackendHandle {
        &self.handle
    }

    /// The bound backend as a trait object.
    pub fn backend(&self) -> Arc<dyn Capabilities> {
        Arc::clone(&self.handle.backend)
    }

    /// Parsed version descriptor of the bound backend.
    ///
    /// Fails with the backend's own error (e.g. the linking diagnostic) if
    /// the version cannot be read; an unparsable descriptor yields `Ok(None)`.
    pub fn version_descriptor(&self) -> BridgeResult<Option<VersionDescriptor>> {
        let raw = self.version()?;
        Ok(VersionDescriptor::parse(&raw).ok())
    }

    pub fn hello_world(&self) -> BridgeResult<String> {
        self.handle.backend.hello_world()
    }

    pub fn add_numbers(&self, a: i64, b: i64) -> BridgeResult<i64> {
        self.handle.backend.add_numbers(a, b)
    }

    pub fn system_info(&self) -> BridgeResult<String> {
        self.handle.backend.system_info()
    }

    pub fn fibonacci(&self, n: i64) -> BridgeResult<i64> {
        self.handle.backend.fibonacci(n)
    }

    pub fn is_prime(&self, n: i64) -> BridgeResult<bool> {
        self.handle.backend.is_prime(n)
    }

    pub fn factorize(&self, n: i64) -> BridgeResult<Vec<i64>> {
        self.handle.backend.factorize(n)
    }

    pub fn create_user(&self, id: i64, name: &str, email: &str) -> BridgeResult<String> {
        self.handle.backend.create_user(id, name, email)
    }

    pub fn validate_email(&self, email: &str) -> BridgeResult<bool> {
        self.handle.backend.validate_email(email)
    }

    pub fn version(&self) -> BridgeResult<String> {
        self.handle.backend.version()
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge").field("handle", &self.handle).finish()
    }
}
