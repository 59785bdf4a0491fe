//! The fixed parity grid.
//!
//! Integer inputs stay inside the native `int` width, and `fibonacci` stops at
//! 46, the last term a 32-bit native implementation computes exactly.

use crate::core::contract::Operation;
use crate::ops::call::{Arg, Invocation};

use super::types::Comparison;

/// One case of the grid.
#[derive(Debug, Clone)]
pub struct ParityCase {
    pub invocation: Invocation,
    pub comparison: Comparison,
}

fn exact(operation: Operation, args: Vec<Arg>) -> ParityCase {
    ParityCase {
        invocation: Invocation::new(operation, args),
        comparison: Comparison::Exact,
    }
}

fn format_only(operation: Operation) -> ParityCase {
    ParityCase {
        invocation: Invocation::new(operation, Vec::new()),
        comparison: Comparison::Format,
    }
}

fn int(v: i64) -> Arg {
    Arg::Int(v)
}

fn text(s: &str) -> Arg {
    Arg::Text(s.to_string())
}

/// Every case, in a stable order.
pub fn parity_cases() -> Vec<ParityCase> {
    let mut cases = vec![
        format_only(Operation::HelloWorld),
        format_only(Operation::GetSystemInfo),
        format_only(Operation::GetVersion),
    ];

    for (a, b) in [(2, 40), (-5, 5), (0, 0), (-1_000, -2_000), (2_147_483_646, 1)] {
        cases.push(exact(Operation::AddNumbers, vec![int(a), int(b)]));
    }

    for n in [0, 1, 2, 10, 20, 30, 46, -1] {
        cases.push(exact(Operation::Fibonacci, vec![int(n)]));
    }

    for n in [-7, 0, 1, 2, 3, 4, 9, 13, 15, 25, 49, 7_919, 1_000_003, 2_147_483_647] {
        cases.push(exact(Operation::IsPrime, vec![int(n)]));
    }

    for n in [2, 12, 13, 360, 1_024, 9_991, 1_000_003, 2_147_483_646, 1, 0, -12] {
        cases.push(exact(Operation::Factorize, vec![int(n)]));
    }

    for (id, name, email) in [
        (1, "John Doe", "john@example.com"),
        (42, "Ada Lovelace", "ada@example.org"),
        (0, "", ""),
    ] {
        cases.push(exact(
            Operation::CreateUser,
            vec![int(id), text(name), text(email)],
        ));
    }

    for email in [
        "test@example.com",
        "a@b.c",
        "first.last+tag@sub.example.co.uk",
        "not-an-email",
        "",
        "user@example",
        "@example.com",
        "us er@example.com",
    ] {
        cases.push(exact(Operation::ValidateEmail, vec![text(email)]));
    }

    cases
}
