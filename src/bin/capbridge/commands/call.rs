//! `capbridge call` command

use anyhow::Result;

use capbridge::core::{fibonacci_is_exact, FIBONACCI_MAX_EXACT};
use capbridge::ops::{self, Arg, Invocation};
use capbridge::util::diagnostic::{self, Diagnostic};
use capbridge::{BackendKind, Bridge, Operation};

use crate::cli::{BackendArgs, CallArgs};

pub fn execute(args: CallArgs, overrides: &BackendArgs) -> Result<()> {
    let invocation = Invocation::parse(&args.operation, &args.args)?;

    let selector = super::selector(overrides)?;
    let bridge = Bridge::connect(&selector);
    if bridge.kind() == BackendKind::Fallback {
        warn_if_saturating(&invocation);
    }

    let value = ops::call(&bridge, &invocation)?;
    if args.json {
        println!("{}", serde_json::to_string(&value)?);
    } else {
        println!("{}", value);
    }

    Ok(())
}

/// Warn when a fallback Fibonacci call will saturate.
fn warn_if_saturating(invocation: &Invocation) {
    if let (Operation::Fibonacci, Some(Arg::Int(n))) = (invocation.operation, invocation.args.first()) {
        if *n >= 0 && !fibonacci_is_exact(*n) {
            diagnostic::emit(
                &Diagnostic::warning(format!(
                    "fibonacci({}) is beyond the exact range (n <= {}); the fallback saturates at {}",
                    n,
                    FIBONACCI_MAX_EXACT,
                    i64::MAX
                )),
                false,
            );
        }
    }
}
