//! Image artifacts produced by the build.
//!
//! - [`esp`] - 64 MiB FAT32 EFI system partition with the app and seed state
//! - [`iso`] - ISO-9660 image booting the ESP through El Torito
//! - [`checksum`] - `sha512sum`-style sidecar files
//!
//! Each builder is a straight-line sequence of steps that stops at the first
//! failure. Temporary staging lives in a [`tempfile::TempDir`] that is removed
//! before the builder returns, on success and on failure.

pub mod checksum;
pub mod esp;
pub mod iso;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use crate::error::{ImageBuildError, Result};

/// Write `bytes` to `dir/name` with its modification time pinned to `epoch`.
///
/// mcopy and xorriso carry file times into the image, so staged inputs get a
/// fixed time to keep repeated builds identical.
pub(crate) fn stage_file(dir: &Path, name: &str, bytes: &[u8], epoch: u64) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, bytes)
        .map_err(|e| ImageBuildError::io(format!("staging '{}'", path.display()), e))?;
    pin_mtime(&path, epoch)?;
    Ok(path)
}

/// Copy `src` to `dir/name` with its modification time pinned to `epoch`.
pub(crate) fn stage_copy(dir: &Path, name: &str, src: &Path, epoch: u64) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::copy(src, &path).map_err(|e| {
        ImageBuildError::io(
            format!("staging '{}' as '{}'", src.display(), path.display()),
            e,
        )
    })?;
    pin_mtime(&path, epoch)?;
    Ok(path)
}

fn pin_mtime(path: &Path, epoch: u64) -> Result<()> {
    let time = UNIX_EPOCH + Duration::from_secs(epoch);
    fs::File::options()
        .write(true)
        .open(path)
        .and_then(|file| file.set_modified(time))
        .map_err(|e| ImageBuildError::io(format!("setting mtime of '{}'", path.display()), e))
}

/// Remove a previous artifact so the new one starts from nothing.
pub(crate) fn remove_existing(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)
            .map_err(|e| ImageBuildError::io(format!("removing old '{}'", path.display()), e))?;
    }
    Ok(())
}

pub(crate) fn staging_dir(prefix: &str) -> Result<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .map_err(|e| ImageBuildError::io("creating staging directory", e))
}

pub(crate) fn close_staging(dir: tempfile::TempDir) -> Result<()> {
    let path = dir.path().to_path_buf();
    dir.close().map_err(|e| {
        ImageBuildError::io(format!("removing staging directory '{}'", path.display()), e)
    })
}
