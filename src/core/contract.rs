//! The capability contract.
//!
//! Every backend implements [`Capabilities`]. The trait is the only way a
//! caller reaches an implementation, so the fallback, the native adapter and
//! the unlinked stand-in are statically checked to expose the same nine
//! operations with the same signatures.

use serde::Serialize;

use crate::core::error::{BridgeError, BridgeResult};

/// Largest `n` for which `fibonacci(n)` fits exactly in an `i64`.
///
/// `fib(92) = 7_540_113_804_746_346_429`; `fib(93)` overflows.
pub const FIBONACCI_MAX_EXACT: i64 = 92;

/// Largest `n` for which `fibonacci(n)` fits in a 32-bit native `int`.
///
/// `fib(46) = 1_836_311_903`; the native loop wraps from `fib(47)` on.
pub const NATIVE_FIBONACCI_MAX_EXACT: i64 = 46;

/// The fixed operation set every backend must satisfy.
///
/// Operations are synchronous. Apart from `system_info` and `version`, each is
/// a pure function of its arguments.
pub trait Capabilities: Send + Sync {
    /// Constant greeting identifying the backend.
    fn hello_world(&self) -> BridgeResult<String>;

    /// `a + b`.
    fn add_numbers(&self, a: i64, b: i64) -> BridgeResult<i64>;

    /// `"<runtime> <version> on <platform> (<arch>) - <qualifier>"`.
    fn system_info(&self) -> BridgeResult<String>;

    /// n-th Fibonacci number, `fib(0) = 0`, `fib(1) = 1`.
    fn fibonacci(&self, n: i64) -> BridgeResult<i64>;

    /// Primality by 6k±1 trial division.
    fn is_prime(&self, n: i64) -> BridgeResult<bool>;

    /// Prime factors of `n` with multiplicity, ascending.
    fn factorize(&self, n: i64) -> BridgeResult<Vec<i64>>;

    /// `User{id: <id>, name: "<name>", email: "<email>"}`.
    fn create_user(&self, id: i64, name: &str, email: &str) -> BridgeResult<String>;

    /// Pragmatic `local@domain.tld` check.
    fn validate_email(&self, email: &str) -> BridgeResult<bool>;

    /// Version descriptor, `<semver>[-<qualifier>]`.
    fn version(&self) -> BridgeResult<String>;
}

/// One operation of the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    HelloWorld,
    AddNumbers,
    GetSystemInfo,
    Fibonacci,
    IsPrime,
    Factorize,
    CreateUser,
    ValidateEmail,
    GetVersion,
}

impl Operation {
    /// Every operation, in contract order.
    pub const ALL: [Operation; 9] = [
        Operation::HelloWorld,
        Operation::AddNumbers,
        Operation::GetSystemInfo,
        Operation::Fibonacci,
        Operation::IsPrime,
        Operation::Factorize,
        Operation::CreateUser,
        Operation::ValidateEmail,
        Operation::GetVersion,
    ];

    /// Contract name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::HelloWorld => "helloWorld",
            Operation::AddNumbers => "addNumbers",
            Operation::GetSystemInfo => "getSystemInfo",
            Operation::Fibonacci => "fibonacci",
            Operation::IsPrime => "isPrime",
            Operation::Factorize => "factorize",
            Operation::CreateUser => "createUser",
            Operation::ValidateEmail => "validateEmail",
            Operation::GetVersion => "getVersion",
        }
    }

    /// Number of arguments the operation takes.
    pub fn arity(&self) -> usize {
        self.params().len()
    }

    /// Parameter names and kinds, in call order.
    pub fn params(&self) -> &'static [(&'static str, ParamKind)] {
        match self {
            Operation::HelloWorld | Operation::GetSystemInfo | Operation::GetVersion => &[],
            Operation::AddNumbers => &[("a", ParamKind::Int), ("b", ParamKind::Int)],
            Operation::Fibonacci | Operation::IsPrime | Operation::Factorize => {
                &[("n", ParamKind::Int)]
            }
            Operation::CreateUser => &[
                ("id", ParamKind::Int),
                ("name", ParamKind::Text),
                ("email", ParamKind::Text),
            ],
            Operation::ValidateEmail => &[("email", ParamKind::Text)],
        }
    }

    /// Human readable signature, e.g. `createUser(id: int, name: string, email: string) -> string`.
    pub fn signature(&self) -> String {
        let params = self
            .params()
            .iter()
            .map(|(name, kind)| format!("{}: {}", name, kind))
            .collect::<Vec<_>>()
            .join(", ");
        let ret = match self {
            Operation::AddNumbers | Operation::Fibonacci => "int",
            Operation::IsPrime | Operation::ValidateEmail => "bool",
            Operation::Factorize => "int[]",
            _ => "string",
        };
        format!("{}({}) -> {}", self.name(), params, ret)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Operation {
    type Err = OperationParseError;

    /// Accepts contract names (`isPrime`) and snake or kebab spellings
    /// (`is_prime`, `is-prime`), case-insensitively. The `get` prefix of the
    /// introspection operations is optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "helloworld" | "hello" => Ok(Operation::HelloWorld),
            "addnumbers" | "add" => Ok(Operation::AddNumbers),
            "getsysteminfo" | "systeminfo" => Ok(Operation::GetSystemInfo),
            "fibonacci" | "fib" => Ok(Operation::Fibonacci),
            "isprime" => Ok(Operation::IsPrime),
            "factorize" => Ok(Operation::Factorize),
            "createuser" => Ok(Operation::CreateUser),
            "validateemail" => Ok(Operation::ValidateEmail),
            "getversion" | "version" => Ok(Operation::GetVersion),
            _ => Err(OperationParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown operation name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation '{0}', run `capbridge list` to see the contract")]
pub struct OperationParseError(pub String);

/// Primitive kind of a contract parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Text,
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamKind::Int => write!(f, "int"),
            ParamKind::Text => write!(f, "string"),
        }
    }
}

/// Reject `fibonacci` inputs below the documented domain.
pub fn check_fibonacci_arg(n: i64) -> BridgeResult<()> {
    if n < 0 {
        return Err(BridgeError::invalid_argument(
            Operation::Fibonacci,
            format!("n must be non-negative, got {}", n),
        ));
    }
    Ok(())
}

/// Reject `factorize` inputs below the documented domain.
pub fn check_factorize_arg(n: i64) -> BridgeResult<()> {
    if n < 2 {
        return Err(BridgeError::invalid_argument(
            Operation::Factorize,
            format!("n must be at least 2, got {}", n),
        ));
    }
    Ok(())
}

/// Whether `fibonacci(n)` is exactly representable.
///
/// Callers that accept user input should flag values where this is false;
/// the fallback still answers them, saturating at `i64::MAX`.
pub fn fibonacci_is_exact(n: i64) -> bool {
    (0..=FIBONACCI_MAX_EXACT).contains(&n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_parse() {
        assert_eq!("isPrime".parse::<Operation>().unwrap(), Operation::IsPrime);
        assert_eq!("is_prime".parse::<Operation>().unwrap(), Operation::IsPrime);
        assert_eq!("IS-PRIME".parse::<Operation>().unwrap(), Operation::IsPrime);
        assert_eq!("version".parse::<Operation>().unwrap(), Operation::GetVersion);
        assert_eq!(
            "get-system-info".parse::<Operation>().unwrap(),
            Operation::GetSystemInfo
        );
        assert!("teleport".parse::<Operation>().is_err());
    }

    #[test]
    fn test_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn test_arity() {
        assert_eq!(Operation::HelloWorld.arity(), 0);
        assert_eq!(Operation::AddNumbers.arity(), 2);
        assert_eq!(Operation::Fibonacci.arity(), 1);
        assert_eq!(Operation::CreateUser.arity(), 3);
        assert_eq!(Operation::ValidateEmail.arity(), 1);
    }

    #[test]
    fn test_signature() {
        assert_eq!(
            Operation::CreateUser.signature(),
            "createUser(id: int, name: string, email: string) -> string"
        );
        assert_eq!(Operation::Factorize.signature(), "factorize(n: int) -> int[]");
        assert_eq!(Operation::GetVersion.signature(), "getVersion() -> string");
    }

    #[test]
    fn test_domain_checks() {
        assert!(check_fibonacci_arg(0).is_ok());
        assert!(check_fibonacci_arg(-1).is_err());
        assert!(check_factorize_arg(2).is_ok());
        assert!(check_factorize_arg(1).is_err());
        assert!(check_factorize_arg(-12).is_err());
    }

    #[test]
    fn test_fibonacci_exact_range() {
        assert!(fibonacci_is_exact(0));
        assert!(fibonacci_is_exact(NATIVE_FIBONACCI_MAX_EXACT));
        assert!(fibonacci_is_exact(92));
        assert!(!fibonacci_is_exact(93));
        assert!(!fibonacci_is_exact(-1));
    }
}
