//! Bootable ISO wrapping the ESP image.
//!
//! The ESP image is stored as a regular file in the ISO and registered as a
//! no-emulation El Torito boot image, so UEFI firmware maps the whole volume
//! as a virtual disk and boots `BOOTX64.EFI` from it.

use std::path::{Path, PathBuf};

use log::info;

use super::{checksum, close_staging, esp, remove_existing, stage_copy, staging_dir};
use crate::config::BuildConfig;
use crate::error::Result;
use crate::preflight::ISO_TOOLS;
use crate::tools::ImageTool;

/// Name of the ESP image inside the ISO, also the El Torito boot file.
pub const ISO_BOOT_FILE: &str = "esp.img";

/// Build the ISO at `config.iso_image`, building the ESP image first if it
/// does not exist yet.
///
/// Also writes a `.sha512` sidecar next to the ISO.
pub fn build_iso(tool: &dyn ImageTool, config: &BuildConfig) -> Result<PathBuf> {
    if !config.esp_image.is_file() {
        info!(
            "{} missing; building the ESP image first",
            config.esp_image.display()
        );
        esp::build_esp(tool, config)?;
    }

    master(tool, config, &config.esp_image, &config.iso_image)?;
    checksum::write_sha512(&config.iso_image)?;
    Ok(config.iso_image.clone())
}

/// Master an ISO at `output` around an existing ESP image.
pub fn master(tool: &dyn ImageTool, config: &BuildConfig, esp_image: &Path, output: &Path) -> Result<()> {
    tool.preflight(ISO_TOOLS)?;

    let staging = staging_dir("ramos-iso-")?;
    stage_copy(
        staging.path(),
        ISO_BOOT_FILE,
        esp_image,
        config.timestamp_epoch,
    )?;

    remove_existing(output)?;
    info!("Mastering {} from {}", output.display(), esp_image.display());
    tool.master_iso(staging.path(), ISO_BOOT_FILE, &config.volume_label, output)?;

    close_staging(staging)?;
    info!("ISO image ready: {}", output.display());
    Ok(())
}
