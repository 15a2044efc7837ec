//! SHA-512 sidecar files for built artifacts.
//!
//! Written in `sha512sum` format with just the file name, so users can run
//! `sha512sum -c ramos.iso.sha512` from the output directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;
use sha2::{Digest, Sha512};

use crate::error::{ImageBuildError, Result};

/// `ramos.iso` -> `ramos.iso.sha512`
pub fn sidecar_path(artifact: &Path) -> PathBuf {
    let mut name = artifact.as_os_str().to_os_string();
    name.push(".sha512");
    PathBuf::from(name)
}

/// Hex SHA-512 digest of a file.
pub fn sha512_hex(path: &Path) -> Result<String> {
    let context = || format!("hashing '{}'", path.display());
    let mut file = fs::File::open(path).map_err(|e| ImageBuildError::io(context(), e))?;
    let mut hasher = Sha512::new();
    io::copy(&mut file, &mut hasher).map_err(|e| ImageBuildError::io(context(), e))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Write the sidecar for `artifact` and return its path.
pub fn write_sha512(artifact: &Path) -> Result<PathBuf> {
    let hash = sha512_hex(artifact)?;
    let filename = artifact
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let sidecar = sidecar_path(artifact);
    fs::write(&sidecar, format!("{}  {}\n", hash, filename))
        .map_err(|e| ImageBuildError::io(format!("writing '{}'", sidecar.display()), e))?;

    info!("SHA512: {}...{}", &hash[..8], &hash[hash.len() - 8..]);
    Ok(sidecar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // sha512("abc")
    const ABC_SHA512: &str = "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
                              2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f";

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            sidecar_path(Path::new("out/ramos.iso")),
            PathBuf::from("out/ramos.iso.sha512")
        );
    }

    #[test]
    fn test_write_sha512() {
        let temp = TempDir::new().unwrap();
        let artifact = temp.path().join("ramos.iso");
        fs::write(&artifact, b"abc").unwrap();

        let sidecar = write_sha512(&artifact).unwrap();

        assert_eq!(
            fs::read_to_string(sidecar).unwrap(),
            format!("{}  ramos.iso\n", ABC_SHA512)
        );
    }
}
