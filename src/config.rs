//! Build paths and image parameters.
//!
//! Everything is a fixed default relative to the working directory; nothing
//! is read from the environment or from files.

use std::path::PathBuf;

/// Where the UEFI application build drops its binary.
pub const DEFAULT_BINARY: &str = "target/x86_64-unknown-uefi/release/ramos.efi";

/// Alternate artifact name tried when [`DEFAULT_BINARY`] is absent.
pub const FALLBACK_BINARY: &str = "target/x86_64-unknown-uefi/release/ramos-uefi.efi";

pub const DEFAULT_ESP_IMAGE: &str = "esp.img";
pub const DEFAULT_ISO_IMAGE: &str = "ramos.iso";

/// Size of the ESP volume.
pub const ESP_SIZE_MIB: u64 = 64;

pub const VOLUME_LABEL: &str = "RAMOS";

/// FAT volume serial, fixed so repeated builds are byte-identical.
pub const VOLUME_ID: u32 = 0x5241_4d53;

/// Timestamp applied to everything written into the images (2020-01-01).
pub const TIMESTAMP_EPOCH: u64 = 1_577_836_800;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Binary locations, tried in order.
    pub binary_candidates: Vec<PathBuf>,
    pub esp_image: PathBuf,
    pub iso_image: PathBuf,
    pub esp_size_mib: u64,
    pub volume_label: String,
    pub volume_id: u32,
    pub timestamp_epoch: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            binary_candidates: vec![PathBuf::from(DEFAULT_BINARY), PathBuf::from(FALLBACK_BINARY)],
            esp_image: PathBuf::from(DEFAULT_ESP_IMAGE),
            iso_image: PathBuf::from(DEFAULT_ISO_IMAGE),
            esp_size_mib: ESP_SIZE_MIB,
            volume_label: VOLUME_LABEL.to_string(),
            volume_id: VOLUME_ID,
            timestamp_epoch: TIMESTAMP_EPOCH,
        }
    }
}

impl BuildConfig {
    pub fn esp_size_bytes(&self) -> u64 {
        self.esp_size_mib * 1024 * 1024
    }

    /// Volume serial in the 8-hex-digit form mkfs.vfat expects.
    pub fn volume_id_hex(&self) -> String {
        format!("{:08X}", self.volume_id)
    }
}
