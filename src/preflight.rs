//! Host tool checks run before a build touches any output.

use std::path::Path;

use crate::error::{ImageBuildError, Result};
use crate::process;

/// Tools needed to build the ESP volume: (command, package).
pub const ESP_TOOLS: &[(&str, &str)] = &[
    ("mkfs.vfat", "dosfstools"),
    ("mmd", "mtools"),
    ("mcopy", "mtools"),
    ("mdir", "mtools"),
];

/// Tools needed to master the ISO on top of the ESP volume.
pub const ISO_TOOLS: &[(&str, &str)] = &[("xorriso", "xorriso")];

/// Check that every listed tool is on PATH.
///
/// Reports all missing tools at once with the package providing each.
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    report_missing(tools.iter().filter(|(tool, _)| !process::exists(tool)))
}

fn report_missing<'a>(missing: impl Iterator<Item = &'a (&'a str, &'a str)>) -> Result<()> {
    let missing: Vec<String> = missing
        .map(|(tool, package)| format!("{} (install: {})", tool, package))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    Err(ImageBuildError::tool(
        "preflight",
        format!("missing required host tools: {}", missing.join(", ")),
    ))
}

/// Like [`check_required_tools`], but for programs kept in `dir`.
pub fn check_tools_in(dir: &Path, tools: &[(&str, &str)]) -> Result<()> {
    report_missing(tools.iter().filter(|(tool, _)| !dir.join(tool).is_file()))
}

/// Check everything `build-iso` may need, ESP tools included.
pub fn check_host_tools() -> Result<()> {
    let all: Vec<(&str, &str)> = ESP_TOOLS.iter().chain(ISO_TOOLS).copied().collect();
    check_required_tools(&all)
}
