//! Contract-to-native symbol translation.
//!
//! The native library exports its own entry point names (`mobileFibonacci`
//! for `fibonacci`, and so on). This table is the single place those names
//! are spelled; the adapter never guesses a symbol from a call site.

use std::collections::BTreeMap;
use std::os::raw::{c_char, c_int};

use crate::core::contract::{Operation, OperationParseError};

/// Default native entry point for each contract operation.
pub const DEFAULT_SYMBOLS: [(Operation, &str); 9] = [
    (Operation::HelloWorld, "helloWorld"),
    (Operation::AddNumbers, "addNumbers"),
    (Operation::GetSystemInfo, "getSystemInfo"),
    (Operation::Fibonacci, "mobileFibonacci"),
    (Operation::IsPrime, "mobileIsPrime"),
    (Operation::Factorize, "mobileFactorize"),
    (Operation::CreateUser, "mobileCreateUser"),
    (Operation::ValidateEmail, "mobileValidateEmail"),
    (Operation::GetVersion, "getCoreVersion"),
];

/// Optional runtime initialiser, called once after loading.
pub const INIT_SYMBOL: &str = "mobileCoreInit";

/// Optional runtime finaliser, called when the adapter is dropped.
pub const SHUTDOWN_SYMBOL: &str = "mobileCoreShutdown";

/// `const char* (void)`
pub type TextFn = unsafe extern "C" fn() -> *const c_char;
/// `int (int, int)`
pub type BinaryIntFn = unsafe extern "C" fn(c_int, c_int) -> c_int;
/// `int (int)`
pub type UnaryIntFn = unsafe extern "C" fn(c_int) -> c_int;
/// `const char* (int)`
pub type IntTextFn = unsafe extern "C" fn(c_int) -> *const c_char;
/// `const char* (int, const char*, const char*)`
pub type CreateUserFn = unsafe extern "C" fn(c_int, *const c_char, *const c_char) -> *const c_char;
/// `int (const char*)`
pub type TextIntFn = unsafe extern "C" fn(*const c_char) -> c_int;
/// `void (void)`
pub type LifecycleFn = unsafe extern "C" fn();

/// Operation-to-symbol mapping used when resolving a library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    entries: BTreeMap<Operation, String>,
}

impl SymbolTable {
    /// The default native names.
    pub fn standard() -> Self {
        SymbolTable {
            entries: DEFAULT_SYMBOLS
                .iter()
                .map(|(op, sym)| (*op, sym.to_string()))
                .collect(),
        }
    }

    /// The default table with per-operation overrides applied.
    ///
    /// Override keys are operation names in any accepted spelling.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Result<Self, OperationParseError> {
        let mut table = Self::standard();
        for (op, symbol) in overrides {
            table.entries.insert(op.parse()?, symbol.clone());
        }
        Ok(table)
    }

    /// Native symbol for `op`.
    pub fn symbol(&self, op: Operation) -> &str {
        self.entries
            .get(&op)
            .map(String::as_str)
            .unwrap_or_else(|| default_symbol(op))
    }

    /// Iterate `(operation, symbol)` in contract order.
    pub fn iter(&self) -> impl Iterator<Item = (Operation, &str)> + '_ {
        self.entries.iter().map(|(op, sym)| (*op, sym.as_str()))
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn default_symbol(op: Operation) -> &'static str {
    DEFAULT_SYMBOLS
        .iter()
        .find(|(o, _)| *o == op)
        .map(|(_, sym)| *sym)
        .unwrap_or("")
}
