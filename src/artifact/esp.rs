//! EFI system partition image.
//!
//! Produces a FAT32 volume laid out as:
//!
//! ```text
//! /EFI/BOOT/BOOTX64.EFI    the application (default removable-media boot path)
//! /EFI/RAMOS/state.txt     seed state for the shell
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use super::{close_staging, remove_existing, stage_copy, stage_file, staging_dir};
use crate::config::BuildConfig;
use crate::error::{ImageBuildError, Result};
use crate::preflight::ESP_TOOLS;
use crate::state;
use crate::tools::ImageTool;

/// Directories created in the volume, parents first.
pub const ESP_DIRS: &[&str] = &["EFI", "EFI/BOOT", "EFI/RAMOS"];

/// Firmware loads this path when no boot entry is configured.
pub const BOOT_BINARY_DEST: &str = "EFI/BOOT/BOOTX64.EFI";

pub const STATE_DEST: &str = "EFI/RAMOS/state.txt";

/// Find the application binary among `candidates`, first match wins.
pub fn locate_binary(candidates: &[PathBuf]) -> Result<PathBuf> {
    candidates
        .iter()
        .find(|path| path.is_file())
        .cloned()
        .ok_or_else(|| ImageBuildError::MissingArtifact {
            candidates: candidates.to_vec(),
        })
}

/// Build the ESP image at `config.esp_image` with the seed state.
///
/// Nothing on disk is touched unless the application binary is found.
pub fn build_esp(tool: &dyn ImageTool, config: &BuildConfig) -> Result<PathBuf> {
    let binary = locate_binary(&config.binary_candidates)?;
    info!("Using application binary {}", binary.display());

    let state_bytes = state::encode(&state::default_state());
    assemble_esp(tool, config, &binary, &state_bytes, &config.esp_image)?;
    Ok(config.esp_image.clone())
}

/// Assemble an ESP volume at `output` from a located binary and encoded
/// state.
pub fn assemble_esp(
    tool: &dyn ImageTool,
    config: &BuildConfig,
    binary: &Path,
    state_bytes: &[u8],
    output: &Path,
) -> Result<()> {
    tool.preflight(ESP_TOOLS)?;

    let staging = staging_dir("ramos-esp-")?;
    let staged_binary = stage_copy(
        staging.path(),
        "BOOTX64.EFI",
        binary,
        config.timestamp_epoch,
    )?;
    let staged_state = stage_file(
        staging.path(),
        "state.txt",
        state_bytes,
        config.timestamp_epoch,
    )?;

    remove_existing(output)?;
    allocate_image(output, config.esp_size_bytes())?;

    info!(
        "Formatting {} ({} MiB FAT32)",
        output.display(),
        config.esp_size_mib
    );
    tool.format_volume(output, &config.volume_label, &config.volume_id_hex())?;

    for dir in ESP_DIRS {
        tool.make_dir(output, dir)?;
    }

    info!("Copying {} and {}", BOOT_BINARY_DEST, STATE_DEST);
    tool.copy_into(output, &staged_binary, BOOT_BINARY_DEST)?;
    tool.copy_into(output, &staged_state, STATE_DEST)?;

    close_staging(staging)?;
    info!("ESP image ready: {}", output.display());
    Ok(())
}

/// Create a zero-filled file of exactly `size` bytes.
fn allocate_image(path: &Path, size: u64) -> Result<()> {
    let context = || format!("allocating {} byte image '{}'", size, path.display());
    let file = fs::File::create(path).map_err(|e| ImageBuildError::io(context(), e))?;
    file.set_len(size)
        .map_err(|e| ImageBuildError::io(context(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::fake::FakeTool;
    use tempfile::TempDir;

    fn test_config(root: &Path) -> BuildConfig {
        BuildConfig {
            binary_candidates: vec![root.join("ramos.efi"), root.join("ramos-uefi.efi")],
            esp_image: root.join("esp.img"),
            iso_image: root.join("ramos.iso"),
            esp_size_mib: 1,
            ..BuildConfig::default()
        }
    }

    #[test]
    fn test_locate_binary_prefers_first_candidate() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        fs::write(&config.binary_candidates[0], b"primary").unwrap();
        fs::write(&config.binary_candidates[1], b"fallback").unwrap();

        assert_eq!(
            locate_binary(&config.binary_candidates).unwrap(),
            config.binary_candidates[0]
        );
    }

    #[test]
    fn test_locate_binary_falls_back() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        fs::write(&config.binary_candidates[1], b"fallback").unwrap();

        assert_eq!(
            locate_binary(&config.binary_candidates).unwrap(),
            config.binary_candidates[1]
        );
    }

    #[test]
    fn test_missing_binary_leaves_existing_image_untouched() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        fs::write(&config.esp_image, b"previous image").unwrap();
        let tool = FakeTool::default();

        let err = build_esp(&tool, &config).unwrap_err();

        assert!(matches!(err, ImageBuildError::MissingArtifact { ref candidates } if candidates.len() == 2));
        assert_eq!(fs::read(&config.esp_image).unwrap(), b"previous image");
        assert!(tool.calls.borrow().is_empty());
    }

    #[test]
    fn test_build_esp_lays_out_volume() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        fs::write(&config.binary_candidates[0], b"MZ-app").unwrap();
        let tool = FakeTool::default();

        let output = build_esp(&tool, &config).unwrap();

        assert_eq!(output, config.esp_image);
        assert_eq!(
            *tool.calls.borrow(),
            vec![
                "preflight mkfs.vfat,mmd,mcopy,mdir",
                "format RAMOS 52414D53",
                "mkdir EFI",
                "mkdir EFI/BOOT",
                "mkdir EFI/RAMOS",
                "copy EFI/BOOT/BOOTX64.EFI",
                "copy EFI/RAMOS/state.txt",
            ]
        );
        let files = tool.files.borrow();
        assert_eq!(files[BOOT_BINARY_DEST], b"MZ-app");
        assert_eq!(files[STATE_DEST], state::encode(&state::default_state()));
    }

    #[test]
    fn test_build_esp_is_repeatable() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        fs::write(&config.binary_candidates[0], b"MZ-app").unwrap();

        build_esp(&FakeTool::default(), &config).unwrap();
        let first = fs::read(&config.esp_image).unwrap();
        build_esp(&FakeTool::default(), &config).unwrap();
        let second = fs::read(&config.esp_image).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_allocated_image_is_zero_filled() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blank.img");

        allocate_image(&path, 4096).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 4096);
        assert!(bytes.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_tool_failure_stops_pipeline() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        fs::write(&config.binary_candidates[0], b"MZ-app").unwrap();
        let tool = FakeTool::failing("format");

        let err = build_esp(&tool, &config).unwrap_err();

        assert!(matches!(err, ImageBuildError::ToolFailure { .. }));
        assert_eq!(tool.calls.borrow().last().unwrap(), "format RAMOS 52414D53");
        assert!(tool.files.borrow().is_empty());
    }

    #[test]
    fn test_preflight_failure_keeps_previous_image() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        fs::write(&config.binary_candidates[0], b"MZ-app").unwrap();
        fs::write(&config.esp_image, b"previous image").unwrap();
        let tool = FakeTool::failing("preflight");

        assert!(build_esp(&tool, &config).is_err());
        assert_eq!(fs::read(&config.esp_image).unwrap(), b"previous image");
    }
}
