//! Capability backends and their selection.
//!
//! - [`fallback`]: deterministic software implementation
//! - [`native`]: adapter over the dynamically loaded native library
//! - [`unlinked`]: fail-loud stand-in
//! - [`selector`]: one-time resolution of which of the above to bind

pub mod email;
pub mod fallback;
pub mod math;
pub mod native;
pub mod selector;
pub mod unlinked;

pub use fallback::FallbackBackend;
pub use native::{NativeApi, NativeBackend, NativeLoadError, NativeOrigin, SymbolTable};
pub use selector::{
    BackendHandle, BackendKind, BackendMode, BackendSelector, LibraryProbe, NativeProbe,
    ProbeOutcome, SelectorSettings,
};
pub use unlinked::UnlinkedBackend;
