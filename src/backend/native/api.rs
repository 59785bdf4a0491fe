//! Resolved native entry points.

use std::fmt;

use crate::backend::native::dl::DynLib;
use crate::backend::native::symbols::{
    BinaryIntFn, CreateUserFn, IntTextFn, LifecycleFn, SymbolTable, TextFn, TextIntFn, UnaryIntFn,
    INIT_SYMBOL, SHUTDOWN_SYMBOL,
};
use crate::core::contract::Operation;

/// Function pointers for every contract operation, plus the optional
/// lifecycle hooks.
///
/// Built either by resolving a [`DynLib`] or by registering functions that
/// are already linked into the process.
#[derive(Clone)]
pub struct NativeApi {
    pub hello_world: TextFn,
    pub add_numbers: BinaryIntFn,
    pub system_info: TextFn,
    pub fibonacci: UnaryIntFn,
    pub is_prime: UnaryIntFn,
    pub factorize: IntTextFn,
    pub create_user: CreateUserFn,
    pub validate_email: TextIntFn,
    pub version: TextFn,
    pub init: Option<LifecycleFn>,
    pub shutdown: Option<LifecycleFn>,
    pub symbols: SymbolTable,
}

impl fmt::Debug for NativeApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeApi")
            .field("symbols", &self.symbols)
            .field("init", &self.init.is_some())
            .field("shutdown", &self.shutdown.is_some())
            .finish()
    }
}

/// A symbol that a library does not export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSymbol {
    pub operation: Operation,
    pub symbol: String,
    pub reason: String,
}

impl NativeApi {
    /// Resolve every entry point named in `table` from `lib`.
    ///
    /// The lifecycle hooks are optional; every contract symbol is required.
    pub fn resolve(lib: &DynLib, table: &SymbolTable) -> Result<Self, MissingSymbol> {
        let lookup = |op: Operation| {
            let symbol = table.symbol(op);
            // SAFETY: only the address is read here; it is cast to the
            // matching signature below.
            unsafe { lib.sym(symbol) }.map_err(|reason| MissingSymbol {
                operation: op,
                symbol: symbol.to_string(),
                reason,
            })
        };

        // SAFETY: each pointer is non-null (checked by `sym`) and the native
        // ABI declares it with exactly the signature it is cast to.
        unsafe {
            Ok(NativeApi {
                hello_world: std::mem::transmute::<*mut _, TextFn>(lookup(Operation::HelloWorld)?),
                add_numbers: std::mem::transmute::<*mut _, BinaryIntFn>(lookup(
                    Operation::AddNumbers,
                )?),
                system_info: std::mem::transmute::<*mut _, TextFn>(lookup(
                    Operation::GetSystemInfo,
                )?),
                fibonacci: std::mem::transmute::<*mut _, UnaryIntFn>(lookup(Operation::Fibonacci)?),
                is_prime: std::mem::transmute::<*mut _, UnaryIntFn>(lookup(Operation::IsPrime)?),
                factorize: std::mem::transmute::<*mut _, IntTextFn>(lookup(Operation::Factorize)?),
                create_user: std::mem::transmute::<*mut _, CreateUserFn>(lookup(
                    Operation::CreateUser,
                )?),
                validate_email: std::mem::transmute::<*mut _, TextIntFn>(lookup(
                    Operation::ValidateEmail,
                )?),
                version: std::mem::transmute::<*mut _, TextFn>(lookup(Operation::GetVersion)?),
                init: lib
                    .sym(INIT_SYMBOL)
                    .ok()
                    .map(|p| std::mem::transmute::<*mut _, LifecycleFn>(p)),
                shutdown: lib
                    .sym(SHUTDOWN_SYMBOL)
                    .ok()
                    .map(|p| std::mem::transmute::<*mut _, LifecycleFn>(p)),
                symbols: table.clone(),
            })
        }
    }
}
