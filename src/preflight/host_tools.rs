//! Host tool availability checks.

use super::types::CheckResult;

/// Tools the pipeline shells out to, with package hints for remediation.
const REQUIRED_TOOLS: &[(&str, &str, &str)] = &[
    ("ldd", "libc-bin", "Lists the dynamic loader and shared libraries of a binary"),
    ("patchelf", "patchelf", "Rewrites the interpreter and rpath of relocated binaries"),
    ("dpkg", "dpkg", "Resolves which package owns a shared library"),
    ("cargo-about", "cargo-about (cargo install cargo-about)", "Generates the crate license manifest"),
    ("tar", "tar", "Creates the output archive"),
];

/// Check that every required host tool is resolvable.
pub fn check_host_tools(sudo_command: &str) -> Vec<CheckResult> {
    let mut results = Vec::new();

    for (tool, package, purpose) in REQUIRED_TOOLS {
        results.push(check_tool_exists(tool, package, purpose));
    }

    // The configured privilege command is just as mandatory as the rest.
    results.push(check_tool_exists(
        sudo_command,
        sudo_command,
        "Runs privileged ownership, set-id and archive operations",
    ));

    results
}

/// Check if a tool exists in PATH.
fn check_tool_exists(tool: &str, package: &str, purpose: &str) -> CheckResult {
    match which::which(tool) {
        Ok(path) => CheckResult::pass(tool, &path.to_string_lossy()),
        Err(_) => CheckResult::fail(
            tool,
            &format!("Not found. Install '{}' package. {}", package, purpose),
        ),
    }
}
