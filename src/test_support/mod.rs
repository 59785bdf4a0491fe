//! Test doubles for the native library and the backend probe.
//!
//! The fake entry points follow the native ABI exactly: `int` arithmetic,
//! `0/1` booleans, and strings returned from a reused buffer that stays valid
//! until the next call on the same thread.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::backend::native::{NativeApi, NativeBackend, SymbolTable};
use crate::backend::selector::{NativeProbe, ProbeOutcome};
use crate::backend::{email, math};

/// Version reported by the fake library.
pub const FAKE_NATIVE_VERSION: &str = "2.2.0";

static INIT_CALLS: AtomicUsize = AtomicUsize::new(0);
static SHUTDOWN_CALLS: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static RETURN_BUFFER: RefCell<CString> = RefCell::new(CString::default());
}

fn hold(text: String) -> *const c_char {
    RETURN_BUFFER.with(|buf| {
        *buf.borrow_mut() = CString::new(text).unwrap();
        buf.borrow().as_ptr()
    })
}

fn text_arg<'a>(ptr: *const c_char) -> &'a str {
    unsafe { CStr::from_ptr(ptr) }.to_str().unwrap()
}

unsafe extern "C" fn fake_hello_world() -> *const c_char {
    hold("Hello from the native core!".to_string())
}

unsafe extern "C" fn fake_add_numbers(a: c_int, b: c_int) -> c_int {
    a.wrapping_add(b)
}

unsafe extern "C" fn fake_system_info() -> *const c_char {
    hold(format!(
        "corebridge {} on {} ({}) - Native",
        FAKE_NATIVE_VERSION,
        std::env::consts::OS,
        std::env::consts::ARCH
    ))
}

/// Iterative loop in 32-bit `int`, wrapping on overflow like the C library.
unsafe extern "C" fn fake_fibonacci(n: c_int) -> c_int {
    if n <= 1 {
        return n;
    }
    let (mut a, mut b): (c_int, c_int) = (0, 1);
    for _ in 2..=n {
        let next = a.wrapping_add(b);
        a = b;
        b = next;
    }
    b
}

unsafe extern "C" fn fake_is_prime(n: c_int) -> c_int {
    c_int::from(math::is_prime(i64::from(n)))
}

unsafe extern "C" fn fake_factorize(n: c_int) -> *const c_char {
    let factors = math::factorize(i64::from(n)).unwrap_or_default();
    let list = factors
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    hold(format!("Factors of {}: {}", n, list))
}

unsafe extern "C" fn fake_create_user(id: c_int, name: *const c_char, email: *const c_char) -> *const c_char {
    hold(format!(
        "User{{id: {}, name: \"{}\", email: \"{}\"}}",
        id,
        text_arg(name),
        text_arg(email)
    ))
}

unsafe extern "C" fn fake_validate_email(email: *const c_char) -> c_int {
    c_int::from(email::validate_email(text_arg(email)))
}

unsafe extern "C" fn fake_version() -> *const c_char {
    hold(FAKE_NATIVE_VERSION.to_string())
}

unsafe extern "C" fn fake_init() {
    INIT_CALLS.fetch_add(1, Ordering::SeqCst);
}

unsafe extern "C" fn fake_shutdown() {
    SHUTDOWN_CALLS.fetch_add(1, Ordering::SeqCst);
}

/// Entry points of an in-process stand-in for the native library.
pub fn fake_native_api() -> NativeApi {
    NativeApi {
        hello_world: fake_hello_world,
        add_numbers: fake_add_numbers,
        system_info: fake_system_info,
        fibonacci: fake_fibonacci,
        is_prime: fake_is_prime,
        factorize: fake_factorize,
        create_user: fake_create_user,
        validate_email: fake_validate_email,
        version: fake_version,
        init: Some(fake_init),
        shutdown: Some(fake_shutdown),
        symbols: SymbolTable::standard(),
    }
}

/// `(init, shutdown)` calls made against the fake library so far.
pub fn lifecycle_counts() -> (usize, usize) {
    (
        INIT_CALLS.load(Ordering::SeqCst),
        SHUTDOWN_CALLS.load(Ordering::SeqCst),
    )
}

/// Probe that records how often it runs.
#[derive(Debug, Clone, Default)]
pub struct CountingProbe {
    calls: Arc<AtomicUsize>,
    native: bool,
}

impl CountingProbe {
    /// A probe that never finds a library.
    pub fn absent() -> Self {
        Self::default()
    }

    /// A probe that always finds the fake library.
    pub fn found() -> Self {
        CountingProbe {
            calls: Arc::default(),
            native: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl NativeProbe for CountingProbe {
    fn probe(&self) -> ProbeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Widen the window in which racing resolvers could both probe.
        std::thread::sleep(std::time::Duration::from_millis(5));
        if self.native {
            ProbeOutcome::Found(NativeBackend::from_api(fake_native_api(), "fake"))
        } else {
            ProbeOutcome::Absent {
                reason: "no library in test".to_string(),
            }
        }
    }
}
