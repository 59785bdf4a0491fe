//! High-level operations.
//!
//! This module contains the implementation of capbridge commands.

pub mod call;
pub mod doctor;
pub mod verify;

pub use call::{call, Arg, CallValue, Invocation};
pub use doctor::{doctor, format_report, CheckResult, DoctorReport};
pub use verify::{verify, OutputFormat, ParityReport};
