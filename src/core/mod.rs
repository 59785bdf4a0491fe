//! Core data types: the capability contract and the values it produces.

pub mod contract;
pub mod error;
pub mod user;
pub mod version;

pub use contract::{
    check_factorize_arg, check_fibonacci_arg, fibonacci_is_exact, Capabilities, Operation,
    OperationParseError, ParamKind, FIBONACCI_MAX_EXACT,
    NATIVE_FIBONACCI_MAX_EXACT,
};
pub use error::{BridgeError, BridgeResult, LinkingDiagnostic};
pub use user::UserRecord;
pub use version::{SystemInfo, VersionDescriptor, DEVELOPMENT_MOCK};
