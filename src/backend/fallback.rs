//! In-process deterministic backend.
//!
//! Implements the whole contract in software. Holds no state between calls,
//! so a single instance can be shared freely across threads.

use crate::backend::{email, math};
use crate::core::contract::Capabilities;
use crate::core::error::BridgeResult;
use crate::core::user::UserRecord;
use crate::core::version::{SystemInfo, VersionDescriptor, DEVELOPMENT_MOCK};

/// Greeting returned by the fallback.
pub const FALLBACK_GREETING: &str = "Hello from capbridge! (Development Fallback)";

/// Environment qualifier in the fallback's system info.
pub const FALLBACK_ENVIRONMENT: &str = "Development Fallback";

/// Software implementation of every contract operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackBackend;

impl FallbackBackend {
    pub fn new() -> Self {
        FallbackBackend
    }

    /// Version descriptor of this build, qualified as a development mock.
    pub fn version_descriptor() -> VersionDescriptor {
        let version = semver::Version::parse(env!("CARGO_PKG_VERSION"))
            .unwrap_or_else(|_| semver::Version::new(0, 0, 0));
        VersionDescriptor::qualified(&version, DEVELOPMENT_MOCK)
            .unwrap_or_else(|_| VersionDescriptor::from(version))
    }

    /// System info for the current process.
    pub fn system_info_value() -> SystemInfo {
        SystemInfo {
            runtime: env!("CARGO_PKG_NAME").trim_end_matches("-cli").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            qualifier: FALLBACK_ENVIRONMENT.to_string(),
        }
    }
}

impl Capabilities for FallbackBackend {
    fn hello_world(&self) -> BridgeResult<String> {
        Ok(FALLBACK_GREETING.to_string())
    }

    fn add_numbers(&self, a: i64, b: i64) -> BridgeResult<i64> {
        math::add_numbers(a, b)
    }

    fn system_info(&self) -> BridgeResult<String> {
        Ok(Self::system_info_value().to_string())
    }

    fn fibonacci(&self, n: i64) -> BridgeResult<i64> {
        math::fibonacci(n)
    }

    fn is_prime(&self, n: i64) -> BridgeResult<bool> {
        Ok(math::is_prime(n))
    }

    fn factorize(&self, n: i64) -> BridgeResult<Vec<i64>> {
        math::factorize(n)
    }

    fn create_user(&self, id: i64, name: &str, email: &str) -> BridgeResult<String> {
        Ok(UserRecord::new(id, name, email).to_string())
    }

    fn validate_email(&self, email: &str) -> BridgeResult<bool> {
        Ok(email::validate_email(email))
    }

    fn version(&self) -> BridgeResult<String> {
        Ok(Self::version_descriptor().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_contract_examples() {
        let backend = FallbackBackend::new();
        assert_eq!(backend.add_numbers(2, 40).unwrap(), 42);
        assert_eq!(backend.fibonacci(10).unwrap(), 55);
        assert!(backend.is_prime(13).unwrap());
        assert_eq!(backend.factorize(12).unwrap(), vec![2, 2, 3]);
        assert!(backend.validate_email("test@example.com").unwrap());
        assert_eq!(
            backend
                .create_user(1, "John Doe", "john@example.com")
                .unwrap(),
            r#"User{id: 1, name: "John Doe", email: "john@example.com"}"#
        );
    }

    #[test]
    fn test_version_is_development_mock() {
        let backend = FallbackBackend::new();
        let version = backend.version().unwrap();
        assert_eq!(version, format!("{}-development-mock", env!("CARGO_PKG_VERSION")));
        assert!(VersionDescriptor::parse(&version)
            .unwrap()
            .is_development_mock());
    }

    #[test]
    fn test_system_info_follows_format() {
        let info = FallbackBackend::new().system_info().unwrap();
        let parsed = SystemInfo::parse(&info).unwrap();
        assert_eq!(parsed.runtime, "capbridge");
        assert_eq!(parsed.platform, std::env::consts::OS);
        assert_eq!(parsed.arch, std::env::consts::ARCH);
        assert_eq!(parsed.qualifier, FALLBACK_ENVIRONMENT);
    }

    #[test]
    fn test_concurrent_calls_agree() {
        let backend: Arc<dyn Capabilities> = Arc::new(FallbackBackend::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let backend = Arc::clone(&backend);
                thread::spawn(move || {
                    (0..50)
                        .map(|n| backend.fibonacci(n + t).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for (t, handle) in handles.into_iter().enumerate() {
            let got = handle.join().unwrap();
            let expected: Vec<_> = (0..50)
                .map(|n| math::fibonacci(n + t as i64).unwrap())
                .collect();
            assert_eq!(got, expected);
        }
    }
}
