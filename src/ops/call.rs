//! Dynamic invocation of contract operations.
//!
//! Turns an operation name plus string arguments (as typed on a command line)
//! into a typed [`Invocation`], and runs it against any backend.

use std::fmt;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::bridge::Bridge;
use crate::core::contract::{Capabilities, Operation, ParamKind};
use crate::core::error::{BridgeError, BridgeResult};

/// One typed argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Int(i64),
    Text(String),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Int(v) => write!(f, "{}", v),
            Arg::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Value returned by an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CallValue {
    Int(i64),
    Bool(bool),
    Text(String),
    Factors(Vec<i64>),
}

impl fmt::Display for CallValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallValue::Int(v) => write!(f, "{}", v),
            CallValue::Bool(b) => write!(f, "{}", b),
            CallValue::Text(s) => write!(f, "{}", s),
            CallValue::Factors(factors) => {
                let list = factors
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "[{}]", list)
            }
        }
    }
}

/// An operation with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub operation: Operation,
    pub args: Vec<Arg>,
}

impl Invocation {
    pub fn new(operation: Operation, args: Vec<Arg>) -> Self {
        Invocation { operation, args }
    }

    /// Parse an operation name and its raw arguments.
    pub fn parse(operation: &str, raw: &[String]) -> Result<Self> {
        let operation: Operation = operation.parse()?;
        let params = operation.params();
        if raw.len() != params.len() {
            bail!(
                "`{}` takes {} argument(s), got {}\n  usage: {}",
                operation,
                params.len(),
                raw.len(),
                operation.signature()
            );
        }

        let args = params
            .iter()
            .zip(raw)
            .map(|((name, kind), value)| match kind {
                ParamKind::Int => value
                    .trim()
                    .parse::<i64>()
                    .map(Arg::Int)
                    .with_context(|| format!("argument `{}` must be an integer, got '{}'", name, value)),
                ParamKind::Text => Ok(Arg::Text(value.clone())),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Invocation { operation, args })
    }

    /// Run against `backend`.
    pub fn invoke(&self, backend: &dyn Capabilities) -> BridgeResult<CallValue> {
        match self.operation {
            Operation::HelloWorld => backend.hello_world().map(CallValue::Text),
            Operation::AddNumbers => backend
                .add_numbers(self.int(0)?, self.int(1)?)
                .map(CallValue::Int),
            Operation::GetSystemInfo => backend.system_info().map(CallValue::Text),
            Operation::Fibonacci => backend.fibonacci(self.int(0)?).map(CallValue::Int),
            Operation::IsPrime => backend.is_prime(self.int(0)?).map(CallValue::Bool),
            Operation::Factorize => backend.factorize(self.int(0)?).map(CallValue::Factors),
            Operation::CreateUser => backend
                .create_user(self.int(0)?, self.text(1)?, self.text(2)?)
                .map(CallValue::Text),
            Operation::ValidateEmail => backend.validate_email(self.text(0)?).map(CallValue::Bool),
            Operation::GetVersion => backend.version().map(CallValue::Text),
        }
    }

    fn int(&self, index: usize) -> BridgeResult<i64> {
        match self.args.get(index) {
            Some(Arg::Int(v)) => Ok(*v),
            _ => Err(self.bad_arg(index)),
        }
    }

    fn text(&self, index: usize) -> BridgeResult<&str> {
        match self.args.get(index) {
            Some(Arg::Text(s)) => Ok(s),
            _ => Err(self.bad_arg(index)),
        }
    }

    fn bad_arg(&self, index: usize) -> BridgeError {
        let expected = self
            .operation
            .params()
            .get(index)
            .map(|(name, kind)| format!("`{}` ({})", name, kind))
            .unwrap_or_else(|| "no argument".to_string());
        BridgeError::invalid_argument(
            self.operation,
            format!("argument {} should be {}", index + 1, expected),
        )
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args = self
            .args
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}({})", self.operation, args)
    }
}

/// Invoke one operation through `bridge`.
pub fn call(bridge: &Bridge, invocation: &Invocation) -> Result<CallValue> {
    tracing::debug!("calling {} on {} backend", invocation, bridge.kind());
    let value = invocation.invoke(bridge.backend().as_ref())?;
    Ok(value)
}
