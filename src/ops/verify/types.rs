//! Public types for the parity check.

use std::time::Duration;

use serde::Serialize;

use crate::backend::selector::BackendKind;
use crate::core::contract::Operation;

/// Output format for verification results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// Machine-readable JSON output
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = OutputFormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            _ => Err(OutputFormatParseError(s.to_string())),
        }
    }
}

/// Error parsing output format option.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid output format '{0}', valid values: human, json")]
pub struct OutputFormatParseError(pub String);

/// How a case's outcome is compared with the fallback's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Comparison {
    /// Values (or error kinds) must be identical.
    Exact,
    /// Only the documented text layout is checked; contents may differ
    /// between backends.
    Format,
}

/// Outcome of one case on one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "status")]
pub enum Outcome {
    Value { value: String },
    Error { kind: String, message: String },
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Value { value } => write!(f, "{}", value),
            Outcome::Error { kind, .. } => write!(f, "error({})", kind),
        }
    }
}

/// Result of one parity case.
#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    /// Rendered invocation, e.g. `fibonacci(10)`
    pub case: String,

    pub operation: Operation,

    pub comparison: Comparison,

    /// Fallback outcome
    pub expected: Outcome,

    /// Active backend outcome
    pub actual: Outcome,

    pub passed: bool,
}

/// Complete parity report.
#[derive(Debug, Clone, Serialize)]
pub struct ParityReport {
    /// Backend that was checked
    pub backend: BackendKind,

    /// Library path or registered name, for a native backend
    pub origin: Option<String>,

    /// Version descriptor reported by the active backend, if any
    pub version: Option<String>,

    pub cases: Vec<CaseResult>,

    /// How long the check took (in milliseconds for JSON)
    #[serde(serialize_with = "serialize_duration_ms")]
    pub duration: Duration,

    pub passed: bool,
}

fn serialize_duration_ms<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}

impl ParityReport {
    /// Number of passing cases.
    pub fn passed_count(&self) -> usize {
        self.cases.iter().filter(|c| c.passed).count()
    }

    /// Failing cases.
    pub fn failures(&self) -> impl Iterator<Item = &CaseResult> {
        self.cases.iter().filter(|c| !c.passed)
    }
}
