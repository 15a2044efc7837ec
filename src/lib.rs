//! Image builder for RAMOS, a small UEFI shell.
//!
//! Produces the EFI system partition image (`esp.img`) holding the prebuilt
//! application and a seed state file, and optionally wraps it in a bootable
//! ISO (`ramos.iso`).
//!
//! - **State** - the persistent shell state and its line format, shared with
//!   the shell that reads and rewrites it at boot
//! - **Artifact builders** - ESP and ISO assembly pipelines
//! - **Tools** - the capability trait over mkfs.vfat, mtools and xorriso
//! - **Preflight checks** - host tool validation before builds
//!
//! # Architecture
//!
//! ```text
//! state::default_state ──> state::encode ──┐
//!                                          ├──> artifact::esp ──> esp.img
//! target/.../ramos.efi ────────────────────┘          │
//!                                                     └──> artifact::iso ──> ramos.iso
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use ramos_image::{artifact, BuildConfig, HostTools};
//!
//! let config = BuildConfig::default();
//! let tools = HostTools::new(config.timestamp_epoch);
//! artifact::iso::build_iso(&tools, &config)?;
//! ```

pub mod artifact;
pub mod config;
pub mod error;
pub mod preflight;
pub mod process;
pub mod state;
pub mod tools;

pub use config::BuildConfig;
pub use error::{ImageBuildError, StateError};
pub use state::State;
pub use tools::{HostTools, ImageTool};
