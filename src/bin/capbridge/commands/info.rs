//! `capbridge info` command

use anyhow::Result;

use capbridge::{Bridge, BridgeResult};

use crate::cli::{BackendArgs, InfoArgs};

pub fn execute(args: InfoArgs, overrides: &BackendArgs) -> Result<()> {
    let selector = super::selector(overrides)?;
    let bridge = Bridge::connect(&selector);
    let settings = selector.settings();

    let version = bridge.version();
    let system_info = bridge.system_info();

    if args.json {
        let report = serde_json::json!({
            "backend": bridge.kind(),
            "mode": settings.mode,
            "capability": settings.capability,
            "origin": bridge.origin(),
            "detail": bridge.handle().detail,
            "version": version.as_ref().ok(),
            "systemInfo": system_info.as_ref().ok(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Backend:     {}", bridge.kind());
    println!("Mode:        {}", settings.mode);
    println!("Capability:  {}", settings.capability);
    if let Some(origin) = bridge.origin() {
        println!("Origin:      {}", origin);
    }
    println!("Detail:      {}", bridge.handle().detail);
    println!("Version:     {}", describe(&version));
    println!("System info: {}", describe(&system_info));

    Ok(())
}

fn describe(result: &BridgeResult<String>) -> String {
    match result {
        Ok(value) => value.clone(),
        Err(e) if e.is_linking_unavailable() => "unavailable (not linked)".to_string(),
        Err(e) => format!("unavailable ({})", e),
    }
}
