//! Preflight checks for the packaging pipeline.
//!
//! Verifies every external tool the pipeline shells out to before any
//! destructive work begins. All tools are evaluated and all failures are
//! reported together, so one missing tool does not hide another.

mod host_tools;
mod types;

use anyhow::{bail, Result};

use crate::config::Config;

pub use host_tools::check_host_tools;
pub use types::{CheckResult, CheckStatus, PreflightReport};

/// Run all preflight checks.
pub fn run_preflight(config: &Config) -> PreflightReport {
    PreflightReport {
        checks: host_tools::check_host_tools(&config.sudo_command),
    }
}

/// Run preflight and bail if any check fails. Nothing has been mutated yet
/// at this point, so a failure leaves no partial artifacts behind.
pub fn run_preflight_or_fail(config: &Config) -> Result<()> {
    let report = run_preflight(config);

    if !report.all_passed() {
        report.print();
        bail!(
            "Preflight failed: {} required tool(s) missing. Install them and re-run.",
            report.fail_count()
        );
    }
    Ok(())
}
