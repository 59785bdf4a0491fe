//! `capbridge list` command

use anyhow::Result;

use capbridge::Operation;

use crate::cli::{BackendArgs, ListArgs};

pub fn execute(args: ListArgs, overrides: &BackendArgs) -> Result<()> {
    let settings = if args.symbols {
        Some(super::load_settings(overrides)?)
    } else {
        None
    };

    println!("Operations:");
    for op in Operation::ALL {
        match &settings {
            Some(settings) => println!(
                "  {:<64} -> {}",
                op.signature(),
                settings.symbols.symbol(op)
            ),
            None => println!("  {}", op.signature()),
        }
    }

    Ok(())
}
