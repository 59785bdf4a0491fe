//! Output formatting for parity reports (human/JSON).

use std::fmt::Write as _;

use super::types::{Comparison, ParityReport};

/// Format a parity report for display (human-readable).
pub fn format_report(report: &ParityReport, verbose: bool) -> String {
    let mut output = String::new();

    let origin = report
        .origin
        .as_deref()
        .map(|o| format!(" from {}", o))
        .unwrap_or_default();
    writeln!(output, "Parity: {} backend{}", report.backend, origin).unwrap();
    if let Some(version) = &report.version {
        writeln!(output, "Version: {}", version).unwrap();
    }
    writeln!(output, "{}", "=".repeat(50)).unwrap();
    writeln!(output).unwrap();

    for case in &report.cases {
        if case.passed && !verbose {
            continue;
        }
        let status = if case.passed { "[OK]" } else { "[FAIL]" };
        let mode = match case.comparison {
            Comparison::Exact => "",
            Comparison::Format => " (format)",
        };
        writeln!(output, "  {} {}{}", status, case.case, mode).unwrap();
        if !case.passed {
            writeln!(output, "      expected: {}", case.expected).unwrap();
            writeln!(output, "      actual:   {}", case.actual).unwrap();
        }
    }
    if verbose || !report.passed {
        writeln!(output).unwrap();
    }

    let status = if report.passed { "PASSED" } else { "FAILED" };
    writeln!(
        output,
        "Result: {} ({}/{} cases match the fallback)",
        status,
        report.passed_count(),
        report.cases.len()
    )
    .unwrap();
    writeln!(output, "Total time: {:.2?}", report.duration).unwrap();

    output
}

/// Format a parity report as JSON.
pub fn format_report_json(report: &ParityReport) -> String {
    serde_json::to_string_pretty(report)
        .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize report: {}"}}"#, e))
}
