//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use capbridge::BackendMode;

/// capbridge - call the capability contract through the configured backend
#[derive(Parser)]
#[command(name = "capbridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub backend: BackendArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides applied on top of config files and the environment.
#[derive(Args, Debug, Clone, Default)]
pub struct BackendArgs {
    /// Deployment mode when the native library is absent (fail-loud, fallback)
    #[arg(long, global = true, value_name = "MODE")]
    pub mode: Option<BackendMode>,

    /// Path to the native library
    #[arg(long, global = true, value_name = "PATH")]
    pub native_lib: Option<PathBuf>,

    /// Do not link the native library (development mode)
    #[arg(long, global = true)]
    pub no_native: bool,

    /// Config file to use instead of .capbridge/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Invoke one contract operation
    Call(CallArgs),

    /// List the contract's operations
    List(ListArgs),

    /// Show the resolved backend
    Info(InfoArgs),

    /// Check configuration and linking health
    Doctor(DoctorArgs),

    /// Compare the active backend with the fallback
    Verify(VerifyArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct CallArgs {
    /// Operation name (e.g. fibonacci, is-prime, createUser)
    pub operation: String,

    /// Operation arguments, in signature order
    #[arg(allow_negative_numbers = true)]
    pub args: Vec<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Also show the native symbol bound to each operation
    #[arg(long)]
    pub symbols: bool,
}

#[derive(Args)]
pub struct InfoArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct DoctorArgs {}

#[derive(Args)]
pub struct VerifyArgs {
    /// Output format (human, json)
    #[arg(long, value_name = "FORMAT", default_value = "human")]
    pub format: capbridge::ops::OutputFormat,

    /// Shorthand for --format json
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
