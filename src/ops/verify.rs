//! Fallback parity verification.
//!
//! The `verify` command runs a fixed grid of cases against the active backend
//! and against the in-process fallback, and reports every case whose outcome
//! differs.
//!
//! ## Usage
//!
//! ```bash
//! capbridge verify                 # Human-readable report
//! capbridge verify --json          # Machine-readable report
//! capbridge --mode fallback verify # Self-check of the fallback
//! ```
//!
//! ## Comparison rules
//!
//! - Exact cases must produce identical values, or errors of the same kind.
//! - `helloWorld`, `getSystemInfo` and `getVersion` legitimately differ
//!   between backends; only their layout is checked.

mod cases;
mod format;
mod types;

use std::time::Instant;

use rayon::prelude::*;

use crate::backend::fallback::FallbackBackend;
use crate::bridge::Bridge;
use crate::core::contract::{Capabilities, Operation};
use crate::core::error::BridgeResult;
use crate::core::version::{SystemInfo, VersionDescriptor};
use crate::ops::call::CallValue;

pub use cases::{parity_cases, ParityCase};
pub use format::{format_report, format_report_json};
pub use types::{CaseResult, Comparison, Outcome, OutputFormat, OutputFormatParseError, ParityReport};

/// Run the parity grid against the backend bound to `bridge`.
pub fn verify(bridge: &Bridge) -> ParityReport {
    let start = Instant::now();
    let active = bridge.backend();
    let fallback = FallbackBackend::new();

    tracing::debug!("verifying {} backend against the fallback", bridge.kind());

    let cases: Vec<CaseResult> = parity_cases()
        .par_iter()
        .map(|case| check_case(case, active.as_ref(), &fallback))
        .collect();

    let passed = cases.iter().all(|c| c.passed);
    ParityReport {
        backend: bridge.kind(),
        origin: bridge.origin().map(str::to_string),
        version: active.version().ok(),
        cases,
        duration: start.elapsed(),
        passed,
    }
}

fn check_case(case: &ParityCase, active: &dyn Capabilities, fallback: &FallbackBackend) -> CaseResult {
    let expected = case.invocation.invoke(fallback);
    let actual = case.invocation.invoke(active);

    let passed = match case.comparison {
        Comparison::Exact => same_outcome(&expected, &actual),
        Comparison::Format => matches!(&actual, Ok(value) if well_formed(case.invocation.operation, value)),
    };

    CaseResult {
        case: case.invocation.to_string(),
        operation: case.invocation.operation,
        comparison: case.comparison,
        expected: outcome(&expected),
        actual: outcome(&actual),
        passed,
    }
}

fn same_outcome(expected: &BridgeResult<CallValue>, actual: &BridgeResult<CallValue>) -> bool {
    match (expected, actual) {
        (Ok(a), Ok(b)) => a == b,
        (Err(a), Err(b)) => a.kind() == b.kind(),
        _ => false,
    }
}

fn well_formed(operation: Operation, value: &CallValue) -> bool {
    let CallValue::Text(text) = value else {
        return false;
    };
    match operation {
        Operation::GetVersion => VersionDescriptor::parse(text).is_ok(),
        Operation::GetSystemInfo => SystemInfo::parse(text).is_some(),
        _ => !text.trim().is_empty(),
    }
}

fn outcome(result: &BridgeResult<CallValue>) -> Outcome {
    match result {
        Ok(value) => Outcome::Value {
            value: value.to_string(),
        },
        Err(e) => Outcome::Error {
            kind: e.kind().to_string(),
            message: e.to_string(),
        },
    }
}
