//! Minimal cross-platform dynamic library loading.
//!
//! Provides `DynLib` for opening the native capability library and resolving
//! its exported symbols at runtime, so the host never needs a link-time
//! dependency on it.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::path::Path;

/// Handle to a dynamically loaded shared library.
pub struct DynLib {
    handle: *mut c_void,
}

// SAFETY: the handle is a process-global resource. Symbol calls are
// serialised by the native adapter, which owns the only `DynLib`.
unsafe impl Send for DynLib {}
unsafe impl Sync for DynLib {}

impl std::fmt::Debug for DynLib {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynLib").field("handle", &self.handle).finish()
    }
}

impl DynLib {
    /// Open a shared library by path.
    ///
    /// On Unix, wraps `dlopen` with `RTLD_NOW | RTLD_LOCAL`.
    /// On Windows, wraps `LoadLibraryA`.
    pub fn open(path: &Path) -> Result<Self, String> {
        let name = path_to_cstring(path)?;

        #[cfg(unix)]
        {
            // SAFETY: name is a valid C string. RTLD_NOW resolves every symbol
            // up front so a broken library fails here rather than mid-call.
            let handle = unsafe { dlopen(name.as_ptr(), RTLD_NOW | RTLD_LOCAL) };
            if handle.is_null() {
                return Err(last_dl_error().unwrap_or_else(|| "unknown dlopen error".to_string()));
            }
            Ok(DynLib { handle })
        }

        #[cfg(windows)]
        {
            let handle = unsafe { LoadLibraryA(name.as_ptr()) };
            if handle.is_null() {
                return Err(format!("LoadLibraryA failed for {}", path.display()));
            }
            Ok(DynLib { handle })
        }

        #[cfg(not(any(unix, windows)))]
        {
            let _ = name;
            Err("dynamic library loading not supported on this platform".to_string())
        }
    }

    /// Look up a symbol by name, returning a raw pointer.
    ///
    /// # Safety
    ///
    /// The caller must cast the returned pointer to the symbol's real
    /// function signature before calling it.
    pub unsafe fn sym(&self, name: &str) -> Result<*mut c_void, String> {
        let symbol = CString::new(name).map_err(|_| format!("symbol name `{}` contains NUL", name))?;

        #[cfg(unix)]
        {
            // Clear any previous error.
            dlerror();
            let ptr = dlsym(self.handle, symbol.as_ptr());
            if let Some(err) = last_dl_error() {
                return Err(err);
            }
            if ptr.is_null() {
                return Err(format!("symbol `{}` resolved to null", name));
            }
            Ok(ptr)
        }

        #[cfg(windows)]
        {
            let ptr = GetProcAddress(self.handle, symbol.as_ptr());
            if ptr.is_null() {
                return Err(format!("GetProcAddress failed for `{}`", name));
            }
            Ok(ptr)
        }

        #[cfg(not(any(unix, windows)))]
        {
            let _ = symbol;
            Err("dynamic library loading not supported on this platform".to_string())
        }
    }
}

impl Drop for DynLib {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            #[cfg(unix)]
            unsafe {
                dlclose(self.handle);
            }

            #[cfg(windows)]
            unsafe {
                FreeLibrary(self.handle);
            }
        }
    }
}

fn path_to_cstring(path: &Path) -> Result<CString, String> {
    #[cfg(unix)]
    let bytes = {
        use std::os::unix::ffi::OsStrExt;
        path.as_os_str().as_bytes().to_vec()
    };
    #[cfg(not(unix))]
    let bytes = path.to_string_lossy().into_owned().into_bytes();

    CString::new(bytes).map_err(|_| format!("library path {} contains NUL", path.display()))
}

#[cfg(unix)]
fn last_dl_error() -> Option<String> {
    // SAFETY: dlerror returns either null or a thread-local C string.
    let err = unsafe { dlerror() };
    if err.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(err) }.to_string_lossy().into_owned())
    }
}

// --- Unix (Linux + macOS) bindings ---

#[cfg(unix)]
const RTLD_NOW: c_int = 2;
#[cfg(all(unix, not(target_vendor = "apple")))]
const RTLD_LOCAL: c_int = 0;
#[cfg(all(unix, target_vendor = "apple"))]
const RTLD_LOCAL: c_int = 4;

#[cfg(unix)]
extern "C" {
    fn dlopen(filename: *const c_char, flags: c_int) -> *mut c_void;
    fn dlsym(handle: *mut c_void, symbol: *const c_char) -> *mut c_void;
    fn dlclose(handle: *mut c_void) -> c_int;
    fn dlerror() -> *const c_char;
}

// --- Windows bindings ---

#[cfg(windows)]
extern "system" {
    fn LoadLibraryA(name: *const c_char) -> *mut c_void;
    fn GetProcAddress(module: *mut c_void, name: *const c_char) -> *mut c_void;
    fn FreeLibrary(module: *mut c_void) -> c_int;
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_library_fails() {
        let err = DynLib::open(Path::new("/nonexistent/libcorebridge-missing.so")).unwrap_err();
        assert!(!err.is_empty());
    }
}
