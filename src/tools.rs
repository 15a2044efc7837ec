//! Filesystem and disc mastering tools behind a narrow capability trait.
//!
//! The builders only sequence steps; everything that touches a FAT volume or
//! masters an ISO goes through [`ImageTool`]. [`HostTools`] drives the real
//! host programs (dosfstools, mtools, xorriso). Tests substitute a fake.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::preflight;
use crate::process::Cmd;

pub trait ImageTool {
    /// Verify the programs behind this tool are usable before any output
    /// is touched.
    fn preflight(&self, _tools: &[(&str, &str)]) -> Result<()> {
        Ok(())
    }

    /// Format an existing zero-filled image file as FAT32.
    fn format_volume(&self, image: &Path, label: &str, volume_id: &str) -> Result<()>;

    /// Create a directory inside the volume. An existing directory is fine.
    fn make_dir(&self, image: &Path, dir: &str) -> Result<()>;

    /// Copy a host file into the volume, replacing any existing file.
    fn copy_into(&self, image: &Path, src: &Path, dest: &str) -> Result<()>;

    /// Master an ISO-9660 image of `root` with `boot_file` (relative to
    /// `root`) as a no-emulation El Torito boot image.
    fn master_iso(&self, root: &Path, boot_file: &str, label: &str, output: &Path) -> Result<()>;
}

/// Host programs, run with a fixed `SOURCE_DATE_EPOCH`.
#[derive(Debug, Clone)]
pub struct HostTools {
    epoch: u64,
    /// Directory to take programs from instead of PATH.
    bin_dir: Option<PathBuf>,
}

impl HostTools {
    pub fn new(epoch: u64) -> Self {
        Self {
            epoch,
            bin_dir: None,
        }
    }

    /// Run programs out of `dir` rather than looking them up on PATH.
    pub fn with_bin_dir(epoch: u64, dir: impl Into<PathBuf>) -> Self {
        Self {
            epoch,
            bin_dir: Some(dir.into()),
        }
    }

    fn cmd(&self, program: &str) -> Cmd {
        let cmd = match &self.bin_dir {
            Some(dir) => Cmd::new(dir.join(program)),
            None => Cmd::new(program),
        };
        cmd.env("SOURCE_DATE_EPOCH", self.epoch.to_string())
    }
}

/// mtools addresses the volume root as `::`.
fn fat_path(path: &str) -> String {
    format!("::/{}", path.trim_start_matches('/'))
}

impl ImageTool for HostTools {
    fn preflight(&self, tools: &[(&str, &str)]) -> Result<()> {
        match &self.bin_dir {
            Some(dir) => preflight::check_tools_in(dir, tools),
            None => preflight::check_required_tools(tools),
        }
    }

    fn format_volume(&self, image: &Path, label: &str, volume_id: &str) -> Result<()> {
        self.cmd("mkfs.vfat")
            .args(["-F", "32", "-n", label, "-i", volume_id])
            .arg_path(image)
            .error_msg(format!("formatting '{}' as FAT32", image.display()))
            .run()?;
        Ok(())
    }

    fn make_dir(&self, image: &Path, dir: &str) -> Result<()> {
        let created = self
            .cmd("mmd")
            .arg("-i")
            .arg_path(image)
            .arg(fat_path(dir))
            .allow_fail()
            .run()?;
        if created.success() {
            return Ok(());
        }

        // mmd refuses existing directories; accept them if they list.
        self.cmd("mdir")
            .args(["-b", "-i"])
            .arg_path(image)
            .arg(fat_path(dir))
            .error_msg(format!("creating directory '{}' in '{}'", dir, image.display()))
            .run()?;
        Ok(())
    }

    fn copy_into(&self, image: &Path, src: &Path, dest: &str) -> Result<()> {
        self.cmd("mcopy")
            .args(["-o", "-m", "-i"])
            .arg_path(image)
            .arg_path(src)
            .arg(fat_path(dest))
            .error_msg(format!("copying '{}' to '{}'", src.display(), dest))
            .run()?;
        Ok(())
    }

    fn master_iso(&self, root: &Path, boot_file: &str, label: &str, output: &Path) -> Result<()> {
        self.cmd("xorriso")
            .args(["-as", "mkisofs", "-o"])
            .arg_path(output)
            .args(["-R", "-V", label])
            .args(["-e", boot_file, "-no-emul-boot"])
            .arg_path(root)
            .error_msg(format!("mastering '{}'", output.display()))
            .run()?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImageBuildError;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// Stub programs that append their name, arguments and
    /// `SOURCE_DATE_EPOCH` to a shared log.
    struct StubBin {
        dir: TempDir,
    }

    impl StubBin {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
            }
        }

        fn log_path(&self) -> PathBuf {
            self.dir.path().join("calls.log")
        }

        fn install(&self, name: &str, exit_code: i32) {
            let script = format!(
                "#!/bin/sh\necho \"{name} $* epoch=$SOURCE_DATE_EPOCH\" >> '{}'\n\
                 [ {exit_code} -ne 0 ] && echo '{name}: stub failure' >&2\n\
                 exit {exit_code}\n",
                self.log_path().display()
            );
            let path = self.dir.path().join(name);
            fs::write(&path, script).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }

        fn tools(&self) -> HostTools {
            HostTools::with_bin_dir(77, self.dir.path())
        }

        fn calls(&self) -> Vec<String> {
            fs::read_to_string(self.log_path())
                .unwrap_or_default()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    #[test]
    fn test_fat_path() {
        assert_eq!(fat_path("EFI/BOOT"), "::/EFI/BOOT");
        assert_eq!(fat_path("/EFI/RAMOS/state.txt"), "::/EFI/RAMOS/state.txt");
    }

    #[test]
    fn test_format_volume_arguments() {
        let bin = StubBin::new();
        bin.install("mkfs.vfat", 0);

        bin.tools()
            .format_volume(Path::new("esp.img"), "RAMOS", "52414D53")
            .unwrap();

        assert_eq!(
            bin.calls(),
            vec!["mkfs.vfat -F 32 -n RAMOS -i 52414D53 esp.img epoch=77"]
        );
    }

    #[test]
    fn test_make_dir_creates_directory() {
        let bin = StubBin::new();
        bin.install("mmd", 0);
        bin.install("mdir", 0);

        bin.tools().make_dir(Path::new("esp.img"), "EFI/BOOT").unwrap();

        assert_eq!(bin.calls(), vec!["mmd -i esp.img ::/EFI/BOOT epoch=77"]);
    }

    #[test]
    fn test_make_dir_accepts_existing_directory() {
        let bin = StubBin::new();
        bin.install("mmd", 1);
        bin.install("mdir", 0);

        bin.tools().make_dir(Path::new("esp.img"), "EFI").unwrap();

        assert_eq!(
            bin.calls(),
            vec![
                "mmd -i esp.img ::/EFI epoch=77",
                "mdir -b -i esp.img ::/EFI epoch=77",
            ]
        );
    }

    #[test]
    fn test_make_dir_fails_when_directory_is_absent() {
        let bin = StubBin::new();
        bin.install("mmd", 1);
        bin.install("mdir", 1);

        let err = bin.tools().make_dir(Path::new("esp.img"), "EFI").unwrap_err();

        match err {
            ImageBuildError::ToolFailure { tool, message } => {
                assert_eq!(tool, "mdir");
                assert!(message.contains("creating directory 'EFI'"));
                assert!(message.ends_with("mdir: stub failure"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_copy_into_arguments() {
        let bin = StubBin::new();
        bin.install("mcopy", 0);

        bin.tools()
            .copy_into(
                Path::new("esp.img"),
                Path::new("stage/BOOTX64.EFI"),
                "EFI/BOOT/BOOTX64.EFI",
            )
            .unwrap();

        assert_eq!(
            bin.calls(),
            vec!["mcopy -o -m -i esp.img stage/BOOTX64.EFI ::/EFI/BOOT/BOOTX64.EFI epoch=77"]
        );
    }

    #[test]
    fn test_master_iso_arguments() {
        let bin = StubBin::new();
        bin.install("xorriso", 0);

        bin.tools()
            .master_iso(Path::new("root"), "esp.img", "RAMOS", Path::new("ramos.iso"))
            .unwrap();

        assert_eq!(
            bin.calls(),
            vec!["xorriso -as mkisofs -o ramos.iso -R -V RAMOS -e esp.img -no-emul-boot root epoch=77"]
        );
    }

    #[test]
    fn test_non_zero_exit_is_tool_failure() {
        let bin = StubBin::new();
        bin.install("xorriso", 2);

        let err = bin
            .tools()
            .master_iso(Path::new("root"), "esp.img", "RAMOS", Path::new("ramos.iso"))
            .unwrap_err();

        match err {
            ImageBuildError::ToolFailure { tool, message } => {
                assert_eq!(tool, "xorriso");
                assert_eq!(message, "mastering 'ramos.iso': xorriso: stub failure");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_preflight_looks_in_bin_dir() {
        let bin = StubBin::new();
        bin.install("xorriso", 0);
        let tools = bin.tools();

        assert!(tools.preflight(&[("xorriso", "xorriso")]).is_ok());
        assert!(tools.preflight(&[("mkfs.vfat", "dosfstools")]).is_err());
    }
}
