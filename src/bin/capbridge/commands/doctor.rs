//! `capbridge doctor` command

use anyhow::Result;

use capbridge::ops::{doctor, format_report};

use crate::cli::{BackendArgs, DoctorArgs};

pub fn execute(_args: DoctorArgs, overrides: &BackendArgs, verbose: bool) -> Result<()> {
    let selector = super::selector(overrides)?;
    let report = doctor(&selector);

    // Print the formatted report
    print!("{}", format_report(&report, verbose));

    // Exit with error code if the configured mode cannot serve calls
    if !report.all_required_passed() {
        std::process::exit(1);
    }

    Ok(())
}
