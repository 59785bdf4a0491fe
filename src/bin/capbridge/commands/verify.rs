//! `capbridge verify` command

use anyhow::Result;

use capbridge::ops::verify::{format_report, format_report_json, verify};
use capbridge::ops::OutputFormat;
use capbridge::Bridge;

use crate::cli::{BackendArgs, VerifyArgs};

pub fn execute(args: VerifyArgs, overrides: &BackendArgs, verbose: bool) -> Result<()> {
    let selector = super::selector(overrides)?;
    let report = verify(&Bridge::connect(&selector));

    let format = if args.json {
        OutputFormat::Json
    } else {
        args.format
    };
    match format {
        OutputFormat::Human => print!("{}", format_report(&report, verbose)),
        OutputFormat::Json => println!("{}", format_report_json(&report)),
    }

    if !report.passed {
        std::process::exit(1);
    }

    Ok(())
}
