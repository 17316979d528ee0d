pub mod system;
pub mod tar;
pub mod utils;
pub mod zip;

use crate::config::ExtractStrategy;
use crate::error::{InstallError, InstallResult};
use crate::models::ArchiveFormat;
use std::fs;
use std::io::Write;
use std::path::Path;

/// A downloaded release archive, consumed once by [`extract`]
#[derive(Debug)]
pub struct Archive {
    bytes: Vec<u8>,
    format: ArchiveFormat,
}

impl Archive {
    pub fn new(bytes: Vec<u8>, format: ArchiveFormat) -> Self {
        Self { bytes, format }
    }

    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Extract `archive` into `extract_to`, creating it if needed.
///
/// The payload is first written to a private temp file in `temp_dir`. That
/// file is removed when this returns, whether extraction worked or not.
pub fn extract(
    archive: Archive,
    extract_to: &Path,
    temp_dir: &Path,
    strategy: ExtractStrategy,
) -> InstallResult<()> {
    fs::create_dir_all(extract_to).map_err(|e| {
        InstallError::io(
            format!("Failed to create extraction directory: {}", extract_to.display()),
            e,
        )
    })?;

    let mut spool = tempfile::Builder::new()
        .prefix("cl-")
        .suffix(archive.format.suffix())
        .tempfile_in(temp_dir)
        .map_err(|e| {
            InstallError::io(
                format!("Failed to create temporary archive in {}", temp_dir.display()),
                e,
            )
        })?;

    spool
        .write_all(&archive.bytes)
        .and_then(|_| spool.flush())
        .map_err(|e| {
            InstallError::io(
                format!("Failed to write temporary archive: {}", spool.path().display()),
                e,
            )
        })?;
    let format = archive.format;
    drop(archive);

    let result = match (strategy, format) {
        (ExtractStrategy::Native, ArchiveFormat::TarGz) => {
            tar::extract_tar_gz(spool.path(), extract_to).map(|_| ())
        }
        (ExtractStrategy::Native, ArchiveFormat::Zip) => {
            zip::extract_zip(spool.path(), extract_to).map(|_| ())
        }
        (ExtractStrategy::System, format) => {
            system::extract_with_system_tool(format, spool.path(), extract_to)
        }
    };

    let spool_path = spool.path().to_path_buf();
    if let Err(e) = spool.close() {
        log::debug!(
            "Failed to remove temporary archive {}: {e}",
            spool_path.display()
        );
    }

    result
}
