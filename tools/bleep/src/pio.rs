//! Delegation to the platformio CLI for the actual device upload.

use std::process::Command;

use crate::error::{Error, Result};

/// Build and upload one environment with `pio run`.
pub fn upload(env: &str) -> Result<()> {
    println!("Uploading environment '{env}'...");
    let status = Command::new("pio")
        .args(["run", "-e", env, "-t", "upload"])
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::ToolFailed {
            tool: "pio".to_string(),
            status,
        })
    }
}
