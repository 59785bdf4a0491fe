//! Configuration and linking health checks.
//!
//! The `doctor` command explains which backend the current configuration
//! binds and why, and whether that backend can serve calls.
//!
//! ## Usage
//!
//! ```bash
//! capbridge doctor           # Quick check
//! capbridge doctor --verbose # Detailed output
//! ```
//!
//! ## Checks Performed
//!
//! - Deployment mode and native enablement
//! - Native library probe (optional in fallback mode)
//! - Resolved backend can serve calls
//! - Version descriptor and system info layout
//! - Fallback self-test

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::backend::fallback::FallbackBackend;
use crate::backend::selector::{BackendKind, BackendMode, BackendSelector};
use crate::bridge::Bridge;
use crate::core::contract::Capabilities;
use crate::core::error::BridgeError;
use crate::core::version::{SystemInfo, VersionDescriptor};
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Result of a single health check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,

    /// Whether the check passed
    pub passed: bool,

    /// Human-readable status message
    pub message: String,

    /// Path to the library (if applicable)
    pub path: Option<PathBuf>,

    /// Version string (if applicable)
    pub version: Option<String>,

    /// How long the check took
    pub duration: Duration,

    /// Whether this check is required or optional
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result.
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            path: None,
            version: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    /// Create a failing check result.
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            passed: false,
            ..Self::pass(name, message)
        }
    }

    /// Mark this check as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set the library path.
    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Summary of all health checks.
#[derive(Debug, Clone, Default)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,

    /// Total time taken
    pub total_duration: Duration,

    /// Environment information
    pub environment: BTreeMap<String, String>,

    /// Remediation when the configured mode cannot serve calls
    pub advice: Option<Diagnostic>,
}

impl DoctorReport {
    /// Create a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a check result.
    pub fn add(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    /// Check if all required checks passed.
    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    /// Get the count of passed checks.
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Get the count of failed checks.
    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    /// Get the count of required failed checks.
    pub fn required_failed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .count()
    }
}

/// Run every check against `selector`, resolving it if needed.
pub fn doctor(selector: &BackendSelector) -> DoctorReport {
    let start = Instant::now();
    let mut report = DoctorReport::new();
    let settings = selector.settings();

    report
        .environment
        .insert("os".to_string(), std::env::consts::OS.to_string());
    report
        .environment
        .insert("arch".to_string(), std::env::consts::ARCH.to_string());
    report
        .environment
        .insert("capability".to_string(), settings.capability.clone());

    // Mode
    let mode_note = if settings.mode == BackendMode::default() {
        " (default)"
    } else {
        ""
    };
    report.add(CheckResult::pass(
        "Deployment mode",
        format!("backend.mode = \"{}\"{}", settings.mode, mode_note),
    ));

    // Native enablement
    if settings.native_enabled {
        report.add(CheckResult::pass(
            "Native linking",
            format!("enabled, probing for `{}`", settings.capability),
        ));
    } else {
        report.add(
            CheckResult::fail(
                "Native linking",
                "disabled (native.enabled = false); development mode",
            )
            .optional(),
        );
    }

    // Resolution
    let resolve_start = Instant::now();
    let bridge = Bridge::connect(selector);
    let resolve_time = resolve_start.elapsed();
    let handle = bridge.handle();

    let native_check = match handle.kind {
        BackendKind::Native => {
            let mut check = CheckResult::pass("Native library", handle.detail.clone());
            if let Some(origin) = &handle.origin {
                check = check.with_path(PathBuf::from(origin));
            }
            check
        }
        _ => CheckResult::fail("Native library", handle.detail.clone()),
    };
    // Only fail-loud deployments depend on the library being present.
    let native_check = if settings.mode == BackendMode::Fallback || !settings.native_enabled {
        native_check.optional()
    } else {
        native_check
    };
    report.add(native_check.with_duration(resolve_time));

    if handle.kind.can_serve() {
        report.add(CheckResult::pass(
            "Resolved backend",
            format!("{} backend serves calls", handle.kind),
        ));
        report.add(check_version(&bridge));
        report.add(check_system_info(&bridge));
    } else {
        report.add(CheckResult::fail(
            "Resolved backend",
            format!("{} backend rejects every call", handle.kind),
        ));
        if let Err(BridgeError::LinkingUnavailable(diag)) = bridge.hello_world() {
            report.advice = Some(
                diag.diagnostic()
                    .with_suggestion(suggestions::USE_FALLBACK)
                    .with_suggestion(suggestions::VERBOSE),
            );
        }
    }

    report.add(check_fallback());

    report.total_duration = start.elapsed();
    report
}

fn check_version(bridge: &Bridge) -> CheckResult {
    match bridge.version() {
        Ok(raw) => match VersionDescriptor::parse(&raw) {
            Ok(desc) => {
                let note = if desc.is_development_mock() {
                    "development mock"
                } else {
                    "production"
                };
                CheckResult::pass("Version descriptor", format!("{} ({})", raw, note))
                    .with_version(raw)
            }
            Err(e) => CheckResult::fail(
                "Version descriptor",
                format!("'{}' is not <semver>[-<qualifier>]: {}", raw, e),
            ),
        },
        Err(e) => CheckResult::fail("Version descriptor", e.to_string()),
    }
}

fn check_system_info(bridge: &Bridge) -> CheckResult {
    match bridge.system_info() {
        Ok(raw) if SystemInfo::parse(&raw).is_some() => CheckResult::pass("System info", raw),
        Ok(raw) => CheckResult::fail(
            "System info",
            format!("'{}' does not follow \"<runtime> <version> on <platform> (<arch>) - <qualifier>\"", raw),
        ),
        Err(e) => CheckResult::fail("System info", e.to_string()),
    }
}

fn check_fallback() -> CheckResult {
    let fallback = FallbackBackend::new();
    let ok = fallback.fibonacci(10).ok() == Some(55)
        && fallback.factorize(12).ok() == Some(vec![2, 2, 3])
        && fallback.is_prime(13).ok() == Some(true)
        && fallback.validate_email("test@example.com").ok() == Some(true);
    if ok {
        CheckResult::pass("Fallback self-test", "software backend answers known values")
    } else {
        CheckResult::fail("Fallback self-test", "software backend returned unexpected values")
    }
}

/// Format the doctor report for display.
pub fn format_report(report: &DoctorReport, verbose: bool) -> String {
    use std::fmt::Write;

    let mut output = String::new();

    writeln!(output, "capbridge Doctor").unwrap();
    writeln!(output, "================\n").unwrap();

    // Environment
    if verbose {
        writeln!(output, "Environment:").unwrap();
        for (key, value) in &report.environment {
            writeln!(output, "  {}: {}", key, value).unwrap();
        }
        writeln!(output).unwrap();
    }

    // Checks
    writeln!(output, "Checks:").unwrap();
    for check in &report.checks {
        let status = if check.passed { "[OK]" } else { "[!!]" };
        let required = if check.required { "" } else { " (optional)" };

        writeln!(output, "  {} {}{}", status, check.name, required).unwrap();

        if verbose || !check.passed {
            writeln!(output, "      {}", check.message).unwrap();
        }
        if verbose {
            if let Some(path) = &check.path {
                writeln!(output, "      Path: {}", path.display()).unwrap();
            }
            if let Some(version) = &check.version {
                writeln!(output, "      Version: {}", version).unwrap();
            }
        }
    }

    writeln!(output).unwrap();

    // Summary
    let passed = report.passed_count();
    let failed = report.failed_count();
    let required_failed = report.required_failed_count();

    writeln!(output, "Summary: {} passed, {} failed", passed, failed).unwrap();

    if required_failed > 0 {
        writeln!(
            output,
            "\nWarning: {} required check(s) failed. Calls will not be served.",
            required_failed
        )
        .unwrap();
    } else if failed > 0 {
        writeln!(
            output,
            "\nAll required checks passed. {} optional check(s) failed.",
            failed
        )
        .unwrap();
    } else {
        writeln!(output, "\nAll checks passed. capbridge is ready to serve calls.").unwrap();
    }

    if let Some(advice) = &report.advice {
        writeln!(output).unwrap();
        output.push_str(&advice.format(false));
    }

    output
}
