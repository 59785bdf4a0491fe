//! One-time backend resolution.
//!
//! A [`BackendSelector`] probes for the native library on first access, binds
//! the native adapter, the fallback or the unlinked stand-in, and caches the
//! result. Resolution never runs twice and a bound handle is never replaced.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::backend::fallback::FallbackBackend;
use crate::backend::native::{NativeApi, NativeBackend, SymbolTable};
use crate::backend::unlinked::UnlinkedBackend;
use crate::core::contract::Capabilities;
use crate::util::config::{self, Config};

/// What to bind when the native library is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendMode {
    /// Bind the unlinked stand-in; every call fails with the linking diagnostic.
    FailLoud,
    /// Bind the in-process fallback.
    Fallback,
}

impl Default for BackendMode {
    /// Fail loudly unless a deployment opts into the fallback.
    fn default() -> Self {
        BackendMode::FailLoud
    }
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendMode::FailLoud => write!(f, "fail-loud"),
            BackendMode::Fallback => write!(f, "fallback"),
        }
    }
}

impl std::str::FromStr for BackendMode {
    type Err = BackendModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "fail-loud" | "failloud" | "strict" => Ok(BackendMode::FailLoud),
            "fallback" => Ok(BackendMode::Fallback),
            _ => Err(BackendModeParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid backend mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid backend mode '{0}', valid values: fail-loud, fallback")]
pub struct BackendModeParseError(pub String);

/// Which implementation a handle is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Native,
    Fallback,
    Unlinked,
}

impl BackendKind {
    /// Whether calls through this backend can produce values.
    pub fn can_serve(&self) -> bool {
        !matches!(self, BackendKind::Unlinked)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Native => write!(f, "native"),
            BackendKind::Fallback => write!(f, "fallback"),
            BackendKind::Unlinked => write!(f, "unlinked"),
        }
    }
}

/// Result of looking for the native library.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// A library (or registered API) was found and fully resolved.
    Found(NativeBackend),
    /// Nothing usable was found.
    Absent { reason: String },
    /// Native linking is switched off.
    Disabled,
}

/// Strategy for locating the native backend.
pub trait NativeProbe: Send + Sync {
    fn probe(&self) -> ProbeOutcome;
}

/// Resolved input to a [`BackendSelector`].
#[derive(Debug, Clone)]
pub struct SelectorSettings {
    pub mode: BackendMode,
    pub native_enabled: bool,
    pub capability: String,
    pub library: Option<PathBuf>,
    pub search_paths: Vec<PathBuf>,
    pub symbols: SymbolTable,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        SelectorSettings {
            mode: BackendMode::default(),
            native_enabled: true,
            capability: config::DEFAULT_CAPABILITY.to_string(),
            library: None,
            search_paths: Vec::new(),
            symbols: SymbolTable::standard(),
        }
    }
}

impl SelectorSettings {
    /// Settings for `mode` with every other field at its default.
    pub fn with_mode(mode: BackendMode) -> Self {
        SelectorSettings {
            mode,
            ..Self::default()
        }
    }

    /// Validate a merged configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mode = config.mode().context("invalid `backend.mode`")?;
        let symbols = SymbolTable::with_overrides(&config.native.symbols)
            .context("invalid `[native.symbols]` override")?;

        Ok(SelectorSettings {
            mode,
            native_enabled: config.native_enabled(),
            capability: config.capability().to_string(),
            library: config.native.library.clone(),
            search_paths: config.native.search_paths.clone(),
            symbols,
        })
    }

    /// Settings from the global and project config files plus the process
    /// environment, degrading to defaults if they cannot be read.
    pub fn discover() -> Self {
        let global = config::global_config_path().unwrap_or_default();
        let project = std::env::current_dir()
            .map(|dir| config::project_config_path(&dir))
            .unwrap_or_default();

        let mut config = config::load_config(&global, &project);
        let settings = config
            .apply_process_env()
            .and_then(|()| Self::from_config(&config));

        settings.unwrap_or_else(|e| {
            tracing::warn!("ignoring capbridge configuration: {:#}", e);
            Self::default()
        })
    }
}

/// Platform file name of the library providing `capability`.
pub fn platform_library_name(capability: &str) -> String {
    format!(
        "{}{}{}",
        std::env::consts::DLL_PREFIX,
        capability,
        std::env::consts::DLL_SUFFIX
    )
}

/// Default probe: a registered API, then library files on disk.
#[derive(Debug, Clone)]
pub struct LibraryProbe {
    capability: String,
    library: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
    symbols: SymbolTable,
    registered: Option<(String, NativeApi)>,
}

impl LibraryProbe {
    pub fn new(settings: &SelectorSettings) -> Self {
        LibraryProbe {
            capability: settings.capability.clone(),
            library: settings.library.clone(),
            search_paths: settings.search_paths.clone(),
            symbols: settings.symbols.clone(),
            registered: None,
        }
    }

    /// Prefer entry points the host already linked into the process.
    pub fn with_registered(mut self, name: impl Into<String>, api: NativeApi) -> Self {
        self.registered = Some((name.into(), api));
        self
    }

    /// Library files to try, in order.
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(library) = &self.library {
            candidates.push(library.clone());
        }

        let file_name = platform_library_name(&self.capability);
        for dir in &self.search_paths {
            candidates.push(dir.join(&file_name));
        }
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            candidates.push(exe_dir.join(&file_name));
        }
        candidates
    }
}

impl NativeProbe for LibraryProbe {
    fn probe(&self) -> ProbeOutcome {
        if let Some((name, api)) = &self.registered {
            tracing::debug!("using registered native capability `{}`", name);
            return ProbeOutcome::Found(NativeBackend::from_api(api.clone(), name.clone()));
        }

        let mut failures = Vec::new();
        for path in self.candidates() {
            if !path.exists() {
                tracing::debug!("no native library at {}", path.display());
                continue;
            }
            match NativeBackend::load(&path, &self.symbols) {
                Ok(native) => {
                    tracing::info!("loaded native library {}", path.display());
                    return ProbeOutcome::Found(native);
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    failures.push(e.to_string());
                }
            }
        }

        let reason = if failures.is_empty() {
            format!(
                "`{}` not found (tried native.library, search paths and the executable directory)",
                platform_library_name(&self.capability)
            )
        } else {
            failures.join("; ")
        };
        ProbeOutcome::Absent { reason }
    }
}

/// The backend bound by a selector.
#[derive(Clone)]
pub struct BackendHandle {
    pub kind: BackendKind,
    pub backend: Arc<dyn Capabilities>,
    /// Library path or registered name for a native binding.
    pub origin: Option<String>,
    /// Why this binding was chosen.
    pub detail: String,
}

impl fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendHandle")
            .field("kind", &self.kind)
            .field("origin", &self.origin)
            .field("detail", &self.detail)
            .finish()
    }
}

/// Resolves and caches the backend for one configuration.
pub struct BackendSelector {
    settings: SelectorSettings,
    probe: Box<dyn NativeProbe>,
    handle: OnceLock<BackendHandle>,
}

static GLOBAL: OnceLock<BackendSelector> = OnceLock::new();

impl BackendSelector {
    /// Selector using the default library probe.
    pub fn new(settings: SelectorSettings) -> Self {
        let probe = LibraryProbe::new(&settings);
        Self::with_probe(settings, Box::new(probe))
    }

    /// Selector using a custom probe.
    pub fn with_probe(settings: SelectorSettings, probe: Box<dyn NativeProbe>) -> Self {
        BackendSelector {
            settings,
            probe,
            handle: OnceLock::new(),
        }
    }

    /// Selector that binds native entry points registered by the host.
    pub fn with_native_api(
        settings: SelectorSettings,
        name: impl Into<String>,
        api: NativeApi,
    ) -> Self {
        let probe = LibraryProbe::new(&settings).with_registered(name, api);
        Self::with_probe(settings, Box::new(probe))
    }

    /// The process-wide selector, configured from [`SelectorSettings::discover`]
    /// unless one was installed first.
    pub fn global() -> &'static BackendSelector {
        GLOBAL.get_or_init(|| BackendSelector::new(SelectorSettings::discover()))
    }

    /// Install the process-wide selector. Fails, returning `selector`, if one
    /// is already in place.
    pub fn install_global(selector: BackendSelector) -> Result<&'static BackendSelector, BackendSelector> {
        GLOBAL.set(selector)?;
        Ok(Self::global())
    }

    pub fn settings(&self) -> &SelectorSettings {
        &self.settings
    }

    /// Whether resolution has already happened.
    pub fn is_resolved(&self) -> bool {
        self.handle.get().is_some()
    }

    /// The bound backend, resolving it on first call.
    ///
    /// Concurrent first callers block until the single resolution finishes
    /// and all observe the same handle.
    pub fn resolve(&self) -> BackendHandle {
        self.handle.get_or_init(|| self.bind()).clone()
    }

    fn bind(&self) -> BackendHandle {
        let outcome = if self.settings.native_enabled {
            self.probe.probe()
        } else {
            ProbeOutcome::Disabled
        };

        let handle = match outcome {
            ProbeOutcome::Found(native) => {
                let origin = native.origin().to_string();
                BackendHandle {
                    kind: BackendKind::Native,
                    backend: Arc::new(native),
                    detail: format!("native capability loaded from {}", origin),
                    origin: Some(origin),
                }
            }
            ProbeOutcome::Absent { reason } => self.bind_without_native(reason),
            ProbeOutcome::Disabled => {
                self.bind_without_native("native linking disabled (native.enabled = false)".to_string())
            }
        };

        tracing::debug!(
            "bound {} backend (mode {}): {}",
            handle.kind,
            self.settings.mode,
            handle.detail
        );
        handle
    }

    fn bind_without_native(&self, reason: String) -> BackendHandle {
        match self.settings.mode {
            BackendMode::Fallback => BackendHandle {
                kind: BackendKind::Fallback,
                backend: Arc::new(FallbackBackend::new()),
                origin: None,
                detail: reason,
            },
            BackendMode::FailLoud => BackendHandle {
                kind: BackendKind::Unlinked,
                backend: Arc::new(UnlinkedBackend::new(self.settings.capability.clone())),
                origin: None,
                detail: reason,
            },
        }
    }
}

impl fmt::Debug for BackendSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSelector")
            .field("settings", &self.settings)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::BridgeError;
    use crate::test_support::{fake_native_api, CountingProbe, FAKE_NATIVE_VERSION};
    use std::thread;

    fn settings(mode: BackendMode) -> SelectorSettings {
        SelectorSettings {
            search_paths: vec![PathBuf::from("/nonexistent/capbridge-test")],
            ..SelectorSettings::with_mode(mode)
        }
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("fail-loud".parse::<BackendMode>().unwrap(), BackendMode::FailLoud);
        assert_eq!("FAIL_LOUD".parse::<BackendMode>().unwrap(), BackendMode::FailLoud);
        assert_eq!("fallback".parse::<BackendMode>().unwrap(), BackendMode::Fallback);
        assert!("sometimes".parse::<BackendMode>().is_err());
        assert_eq!(BackendMode::default(), BackendMode::FailLoud);
        assert_eq!(BackendMode::FailLoud.to_string(), "fail-loud");
    }

    #[test]
    fn test_platform_library_name() {
        let name = platform_library_name("corebridge");
        assert!(name.contains("corebridge"));
        #[cfg(target_os = "linux")]
        assert_eq!(name, "libcorebridge.so");
        #[cfg(target_os = "macos")]
        assert_eq!(name, "libcorebridge.dylib");
        #[cfg(windows)]
        assert_eq!(name, "corebridge.dll");
    }

    #[test]
    fn test_candidates_order() {
        let mut s = settings(BackendMode::FailLoud);
        s.library = Some(PathBuf::from("/opt/explicit/libcore.so"));
        let candidates = LibraryProbe::new(&s).candidates();
        assert_eq!(candidates[0], PathBuf::from("/opt/explicit/libcore.so"));
        assert_eq!(
            candidates[1],
            PathBuf::from("/nonexistent/capbridge-test").join(platform_library_name("corebridge"))
        );
    }

    #[test]
    fn test_fail_loud_binds_unlinked() {
        let selector = BackendSelector::new(settings(BackendMode::FailLoud));
        let handle = selector.resolve();
        assert_eq!(handle.kind, BackendKind::Unlinked);
        assert!(!handle.kind.can_serve());
        assert!(matches!(
            handle.backend.fibonacci(10),
            Err(BridgeError::LinkingUnavailable(_))
        ));
    }

    #[test]
    fn test_fallback_mode_binds_fallback() {
        let selector = BackendSelector::new(settings(BackendMode::Fallback));
        let handle = selector.resolve();
        assert_eq!(handle.kind, BackendKind::Fallback);
        assert_eq!(handle.backend.fibonacci(10).unwrap(), 55);
        assert!(handle.detail.contains("not found"));
    }

    #[test]
    fn test_disabled_native_skips_probe() {
        let probe = CountingProbe::found();
        let mut s = settings(BackendMode::Fallback);
        s.native_enabled = false;
        let selector = BackendSelector::with_probe(s, Box::new(probe.clone()));

        let handle = selector.resolve();
        assert_eq!(handle.kind, BackendKind::Fallback);
        assert_eq!(probe.calls(), 0);
        assert!(handle.detail.contains("disabled"));
    }

    #[test]
    fn test_registered_api_wins() {
        let selector =
            BackendSelector::with_native_api(settings(BackendMode::FailLoud), "fake", fake_native_api());
        let handle = selector.resolve();
        assert_eq!(handle.kind, BackendKind::Native);
        assert_eq!(handle.origin.as_deref(), Some("registered `fake`"));
        assert_eq!(handle.backend.version().unwrap(), FAKE_NATIVE_VERSION);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let selector = BackendSelector::new(settings(BackendMode::Fallback));
        assert!(!selector.is_resolved());

        let first = selector.resolve();
        let second = selector.resolve();
        assert!(selector.is_resolved());
        assert!(Arc::ptr_eq(&first.backend, &second.backend));
        assert_eq!(first.backend.version().unwrap(), second.backend.version().unwrap());
    }

    #[test]
    fn test_concurrent_first_access_probes_once() {
        let probe = CountingProbe::absent();
        let selector = Arc::new(BackendSelector::with_probe(
            settings(BackendMode::Fallback),
            Box::new(probe.clone()),
        ));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let selector = Arc::clone(&selector);
                thread::spawn(move || selector.resolve())
            })
            .collect();
        let resolved: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(probe.calls(), 1);
        for handle in &resolved[1..] {
            assert!(Arc::ptr_eq(&resolved[0].backend, &handle.backend));
        }
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.backend.mode = Some("fallback".to_string());
        config
            .native
            .symbols
            .insert("fibonacci".to_string(), "fib_v2".to_string());

        let s = SelectorSettings::from_config(&config).unwrap();
        assert_eq!(s.mode, BackendMode::Fallback);
        assert!(s.native_enabled);
        assert_eq!(s.capability, "corebridge");
        assert_eq!(
            s.symbols.symbol(crate::core::contract::Operation::Fibonacci),
            "fib_v2"
        );

        config.backend.mode = Some("bogus".to_string());
        assert!(SelectorSettings::from_config(&config).is_err());
    }

    #[test]
    fn test_discover_yields_usable_settings() {
        // Whatever the host's config files and environment hold, discovery
        // degrades to something a selector can resolve.
        let s = SelectorSettings::discover();
        assert!(!s.capability.is_empty());
        assert_eq!(s.symbols.iter().count(), 9);

        let mut s = s;
        s.native_enabled = false;
        let handle = BackendSelector::new(s).resolve();
        assert_ne!(handle.kind, BackendKind::Native);
    }
}
