//! Adapter over the native capability library.
//!
//! Translates between the contract's Rust types and the library's C ABI:
//! integers are range-checked into `c_int`, strings cross as NUL-terminated
//! buffers, `0/1` results become `bool` and the factor listing is parsed back
//! into a vector. Calls are serialised because the library reuses static
//! return buffers.

pub mod api;
pub mod dl;
pub mod symbols;

use std::ffi::{CStr, CString};
use std::fmt;
use std::os::raw::{c_char, c_int};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

pub use api::{MissingSymbol, NativeApi};
pub use dl::DynLib;
pub use symbols::SymbolTable;

use crate::core::contract::{
    check_factorize_arg, check_fibonacci_arg, Capabilities, Operation, NATIVE_FIBONACCI_MAX_EXACT,
};
use crate::core::error::{BridgeError, BridgeResult};

/// Failure to turn a library on disk into a usable backend.
#[derive(Debug, Error)]
pub enum NativeLoadError {
    #[error("failed to load native library {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("native library {path} does not export `{symbol}` (needed by `{operation}`): {reason}")]
    MissingSymbol {
        path: PathBuf,
        symbol: String,
        operation: Operation,
        reason: String,
    },
}

/// Where the native entry points came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeOrigin {
    /// Loaded from a shared library on disk.
    Library(PathBuf),
    /// Registered in-process by the host under the given name.
    Registered(String),
}

impl fmt::Display for NativeOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeOrigin::Library(path) => write!(f, "{}", path.display()),
            NativeOrigin::Registered(name) => write!(f, "registered `{}`", name),
        }
    }
}

/// Backend that forwards every operation to the native library.
pub struct NativeBackend {
    api: NativeApi,
    origin: NativeOrigin,
    call_lock: Mutex<()>,
    // Must outlive every pointer in `api`; dropped after `Drop::drop` runs.
    _lib: Option<DynLib>,
}

impl fmt::Debug for NativeBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeBackend")
            .field("origin", &self.origin)
            .field("api", &self.api)
            .finish()
    }
}

impl NativeBackend {
    /// Open `path` and resolve every contract symbol through `table`.
    pub fn load(path: &Path, table: &SymbolTable) -> Result<Self, NativeLoadError> {
        let lib = DynLib::open(path).map_err(|reason| NativeLoadError::Open {
            path: path.to_path_buf(),
            reason,
        })?;
        let api = NativeApi::resolve(&lib, table).map_err(|m| NativeLoadError::MissingSymbol {
            path: path.to_path_buf(),
            symbol: m.symbol,
            operation: m.operation,
            reason: m.reason,
        })?;

        tracing::debug!("resolved {} native symbols from {}", table.iter().count(), path.display());
        Ok(Self::init(api, NativeOrigin::Library(path.to_path_buf()), Some(lib)))
    }

    /// Wrap entry points the host linked into the process itself.
    pub fn from_api(api: NativeApi, name: impl Into<String>) -> Self {
        Self::init(api, NativeOrigin::Registered(name.into()), None)
    }

    fn init(api: NativeApi, origin: NativeOrigin, lib: Option<DynLib>) -> Self {
        if let Some(init) = api.init {
            tracing::debug!("initialising native runtime ({})", origin);
            // SAFETY: the hook takes no arguments and the library is loaded.
            unsafe { init() };
        }
        NativeBackend {
            api,
            origin,
            call_lock: Mutex::new(()),
            _lib: lib,
        }
    }

    pub fn origin(&self) -> &NativeOrigin {
        &self.origin
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The guarded state is `()`, so a poisoned lock carries nothing stale.
        self.call_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn symbol(&self, op: Operation) -> &str {
        self.api.symbols.symbol(op)
    }

    /// Call a string-returning entry point and copy the result out while the
    /// lock is still held.
    fn call_text(&self, op: Operation, f: impl FnOnce() -> *const c_char) -> BridgeResult<String> {
        let _guard = self.lock();
        let ptr = f();
        read_c_str(ptr).ok_or_else(|| BridgeError::native_call(self.symbol(op), "returned null"))
    }

    fn call_int(&self, f: impl FnOnce() -> c_int) -> c_int {
        let _guard = self.lock();
        f()
    }
}

impl Drop for NativeBackend {
    fn drop(&mut self) {
        if let Some(shutdown) = self.api.shutdown {
            let _guard = self.lock();
            tracing::debug!("shutting down native runtime ({})", self.origin);
            // SAFETY: the library is still loaded; `_lib` drops after this.
            unsafe { shutdown() };
        }
    }
}

impl Capabilities for NativeBackend {
    fn hello_world(&self) -> BridgeResult<String> {
        let f = self.api.hello_world;
        // SAFETY: no arguments; result is read before the lock is released.
        self.call_text(Operation::HelloWorld, || unsafe { f() })
    }

    fn add_numbers(&self, a: i64, b: i64) -> BridgeResult<i64> {
        let op = Operation::AddNumbers;
        let (ca, cb) = (to_c_int(op, "a", a)?, to_c_int(op, "b", b)?);
        // The native sum is computed in `int`; reject inputs that would wrap.
        ca.checked_add(cb).ok_or_else(|| {
            BridgeError::invalid_argument(op, format!("{} + {} overflows the native int width", a, b))
        })?;
        let f = self.api.add_numbers;
        Ok(i64::from(self.call_int(|| unsafe { f(ca, cb) })))
    }

    fn system_info(&self) -> BridgeResult<String> {
        let f = self.api.system_info;
        self.call_text(Operation::GetSystemInfo, || unsafe { f() })
    }

    fn fibonacci(&self, n: i64) -> BridgeResult<i64> {
        let op = Operation::Fibonacci;
        check_fibonacci_arg(n)?;
        // The native loop wraps silently past this point, often to positive values.
        if n > NATIVE_FIBONACCI_MAX_EXACT {
            return Err(BridgeError::invalid_argument(
                op,
                format!(
                    "n = {} exceeds {}, the largest term the native int width holds",
                    n, NATIVE_FIBONACCI_MAX_EXACT
                ),
            ));
        }
        let cn = to_c_int(op, "n", n)?;
        let f = self.api.fibonacci;
        let result = self.call_int(|| unsafe { f(cn) });
        if result < 0 {
            return Err(BridgeError::native_call(
                self.symbol(op),
                format!("fibonacci({}) returned negative value {}", n, result),
            ));
        }
        Ok(i64::from(result))
    }

    fn is_prime(&self, n: i64) -> BridgeResult<bool> {
        let cn = to_c_int(Operation::IsPrime, "n", n)?;
        let f = self.api.is_prime;
        Ok(self.call_int(|| unsafe { f(cn) }) != 0)
    }

    fn factorize(&self, n: i64) -> BridgeResult<Vec<i64>> {
        let op = Operation::Factorize;
        check_factorize_arg(n)?;
        let cn = to_c_int(op, "n", n)?;
        let f = self.api.factorize;
        let text = self.call_text(op, || unsafe { f(cn) })?;
        parse_factor_text(&text).ok_or_else(|| {
            BridgeError::native_call(
                self.symbol(op),
                format!("unrecognised factor listing {:?}", text),
            )
        })
    }

    fn create_user(&self, id: i64, name: &str, email: &str) -> BridgeResult<String> {
        let op = Operation::CreateUser;
        let cid = to_c_int(op, "id", id)?;
        let cname = to_c_string(op, "name", name)?;
        let cemail = to_c_string(op, "email", email)?;
        let f = self.api.create_user;
        // SAFETY: both strings outlive the call.
        self.call_text(op, || unsafe { f(cid, cname.as_ptr(), cemail.as_ptr()) })
    }

    fn validate_email(&self, email: &str) -> BridgeResult<bool> {
        let cemail = to_c_string(Operation::ValidateEmail, "email", email)?;
        let f = self.api.validate_email;
        Ok(self.call_int(|| unsafe { f(cemail.as_ptr()) }) != 0)
    }

    fn version(&self) -> BridgeResult<String> {
        let f = self.api.version;
        self.call_text(Operation::GetVersion, || unsafe { f() })
    }
}

fn to_c_int(op: Operation, param: &str, value: i64) -> BridgeResult<c_int> {
    c_int::try_from(value).map_err(|_| {
        BridgeError::invalid_argument(
            op,
            format!(
                "{} = {} is outside the native int range [{}, {}]",
                param,
                value,
                c_int::MIN,
                c_int::MAX
            ),
        )
    })
}

fn to_c_string(op: Operation, param: &str, value: &str) -> BridgeResult<CString> {
    CString::new(value).map_err(|_| {
        BridgeError::invalid_argument(op, format!("{} contains an interior NUL byte", param))
    })
}

fn read_c_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null pointers returned by the library are NUL-terminated.
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

/// Parse `"Factors of <n>: a, b, c"` (or a bare `"a, b, c"`) into factors.
fn parse_factor_text(text: &str) -> Option<Vec<i64>> {
    let list = text.rsplit_once(':').map_or(text, |(_, rest)| rest).trim();
    if list.is_empty() {
        return None;
    }
    list.split(',')
        .map(|part| part.trim().parse::<i64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fallback::FallbackBackend;
    use crate::test_support::{fake_native_api, lifecycle_counts};
    use std::sync::Arc;
    use std::thread;

    fn backend() -> NativeBackend {
        NativeBackend::from_api(fake_native_api(), "fake")
    }

    #[test]
    fn test_parse_factor_text() {
        assert_eq!(parse_factor_text("Factors of 12: 2, 2, 3"), Some(vec![2, 2, 3]));
        assert_eq!(parse_factor_text("Factors of 13: 13"), Some(vec![13]));
        assert_eq!(parse_factor_text("2,5"), Some(vec![2, 5]));
        assert_eq!(parse_factor_text("Factors of 12:"), None);
        assert_eq!(parse_factor_text("Factors of 12: two"), None);
    }

    #[test]
    fn test_translates_results() {
        let native = backend();
        assert_eq!(native.add_numbers(2, 40).unwrap(), 42);
        assert_eq!(native.fibonacci(10).unwrap(), 55);
        assert!(native.is_prime(13).unwrap());
        assert!(!native.is_prime(1).unwrap());
        assert_eq!(native.factorize(12).unwrap(), vec![2, 2, 3]);
        assert!(native.validate_email("test@example.com").unwrap());
        assert!(!native.validate_email("not-an-email").unwrap());
        assert_eq!(
            native.create_user(1, "John Doe", "john@example.com").unwrap(),
            r#"User{id: 1, name: "John Doe", email: "john@example.com"}"#
        );
    }

    #[test]
    fn test_agrees_with_fallback_in_native_domain() {
        let native = backend();
        let fallback = FallbackBackend::new();
        for n in 0..=46 {
            assert_eq!(native.fibonacci(n).unwrap(), fallback.fibonacci(n).unwrap(), "fib({})", n);
        }
        for n in 2..300 {
            assert_eq!(native.is_prime(n).unwrap(), fallback.is_prime(n).unwrap(), "prime({})", n);
            assert_eq!(native.factorize(n).unwrap(), fallback.factorize(n).unwrap(), "factor({})", n);
        }
    }

    #[test]
    fn test_domain_errors_match_fallback() {
        let native = backend();
        assert!(matches!(native.fibonacci(-1), Err(BridgeError::InvalidArgument { .. })));
        assert!(matches!(native.factorize(1), Err(BridgeError::InvalidArgument { .. })));
        assert!(matches!(native.factorize(-12), Err(BridgeError::InvalidArgument { .. })));
    }

    #[test]
    fn test_rejects_values_outside_c_int() {
        let native = backend();
        let err = native.is_prime(i64::from(c_int::MAX) + 1).unwrap_err();
        assert!(err.to_string().contains("outside the native int range"));
        assert!(native.add_numbers(c_int::MAX as i64, 1).is_err());
        assert!(native.create_user(1, "a\0b", "x@y.z").is_err());
    }

    unsafe extern "C" fn negative_fibonacci(_n: c_int) -> c_int {
        -1
    }

    #[test]
    fn test_fibonacci_beyond_native_width_is_rejected() {
        let native = backend();
        assert_eq!(native.fibonacci(46).unwrap(), 1_836_311_903);

        // The wrapping loop would answer 512_559_680 and 1_820_529_360 here.
        for n in [47, 48, 60, 92] {
            let err = native.fibonacci(n).unwrap_err();
            assert!(
                matches!(err, BridgeError::InvalidArgument { operation: Operation::Fibonacci, .. }),
                "fib({}) gave {:?}",
                n,
                err
            );
        }
        assert!(native.fibonacci(47).unwrap_err().to_string().contains("exceeds 46"));
    }

    #[test]
    fn test_wrapping_native_loop_disagrees_past_width() {
        let f = fake_native_api().fibonacci;
        let raw = unsafe { f(48) };
        assert!(raw > 0);
        assert_ne!(i64::from(raw), FallbackBackend::new().fibonacci(48).unwrap());
    }

    #[test]
    fn test_negative_native_result_is_reported() {
        let mut api = fake_native_api();
        api.fibonacci = negative_fibonacci;
        let native = NativeBackend::from_api(api, "broken");
        let err = native.fibonacci(10).unwrap_err();
        assert!(matches!(err, BridgeError::NativeCall { ref symbol, .. } if symbol == "mobileFibonacci"));
    }

    #[test]
    fn test_lifecycle_hooks_run_once() {
        let (init_before, shutdown_before) = lifecycle_counts();
        {
            let _native = backend();
            assert!(lifecycle_counts().0 > init_before);
        }
        assert!(lifecycle_counts().1 > shutdown_before);
    }

    #[test]
    fn test_concurrent_text_calls_are_serialised() {
        let native = Arc::new(backend());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let native = Arc::clone(&native);
                thread::spawn(move || {
                    for i in 0..100 {
                        let id = t * 1000 + i;
                        let record = native.create_user(id, "Ada", "ada@example.com").unwrap();
                        assert!(record.starts_with(&format!("User{{id: {},", id)), "{}", record);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }

    // glibc's soname; dlopen searches the system library paths for it.
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    const SYSTEM_LIBRARY: &str = "libc.so.6";

    #[test]
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    fn test_load_library_without_contract_symbols() {
        let err = NativeBackend::load(Path::new(SYSTEM_LIBRARY), &SymbolTable::standard()).unwrap_err();
        match &err {
            NativeLoadError::MissingSymbol {
                symbol,
                operation,
                path,
                ..
            } => {
                assert_eq!(symbol, "helloWorld");
                assert_eq!(*operation, Operation::HelloWorld);
                assert_eq!(path, Path::new(SYSTEM_LIBRARY));
            }
            other => panic!("expected MissingSymbol, got {:?}", other),
        }
        assert!(err.to_string().contains("does not export `helloWorld`"));
    }

    #[test]
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    fn test_load_reports_overridden_symbol() {
        let mut overrides = std::collections::BTreeMap::new();
        for op in ["helloWorld", "addNumbers", "getSystemInfo"] {
            overrides.insert(op.to_string(), "abs".to_string());
        }
        overrides.insert("fibonacci".to_string(), "fib_v2".to_string());
        let table = SymbolTable::with_overrides(&overrides).unwrap();

        let err = NativeBackend::load(Path::new(SYSTEM_LIBRARY), &table).unwrap_err();
        assert!(matches!(
            err,
            NativeLoadError::MissingSymbol { ref symbol, operation: Operation::Fibonacci, .. }
                if symbol == "fib_v2"
        ));
        assert!(err.to_string().contains("`fib_v2` (needed by `fibonacci`)"));
    }

    #[test]
    fn test_load_missing_library() {
        let err = NativeBackend::load(
            Path::new("/nonexistent/libcorebridge.so"),
            &SymbolTable::standard(),
        )
        .unwrap_err();
        assert!(matches!(err, NativeLoadError::Open { .. }));
    }
}
