//! Reachability probe run before a browser is launched.

use std::process::Command;

use crate::harness::{HarnessError, HarnessResult};

/// HTTP status of a HEAD request, `0` when no connection was made
pub fn probe_status(base_url: &str, timeout_secs: u64) -> HarnessResult<u16> {
    // curl reports 000 when the connection fails entirely
    let output = Command::new("curl")
        .args([
            "-s",
            "-o", "/dev/null",
            "-w", "%{http_code}",
            "--connect-timeout", &timeout_secs.to_string(),
            "--max-time", &timeout_secs.to_string(),
            "-I",
            base_url,
        ])
        .output()?;

    let status = String::from_utf8_lossy(&output.stdout);
    Ok(status.trim().parse().unwrap_or(0))
}

/// Fail with `Unreachable` unless the target answers with any HTTP status
pub fn check_reachable(base_url: &str, timeout_secs: u64) -> HarnessResult<u16> {
    let status = probe_status(base_url, timeout_secs)?;
    if status == 0 {
        return Err(HarnessError::Unreachable(base_url.to_string()));
    }
    tracing::info!(%base_url, status, "target reachable");
    Ok(status)
}
