use crate::error::{InstallError, InstallResult};
use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tar::Archive;

/// Extract TAR.GZ archive, returns list of extracted file paths
pub fn extract_tar_gz(tar_path: &Path, extract_to: &Path) -> InstallResult<Vec<PathBuf>> {
    let file = fs::File::open(tar_path).map_err(|e| {
        InstallError::io(format!("Failed to open tar.gz file: {}", tar_path.display()), e)
    })?;

    extract_tar_from_reader(GzDecoder::new(file), extract_to)
}

/// Extract a TAR stream. Entries that would land outside `extract_to` are skipped.
fn extract_tar_from_reader<R: Read>(reader: R, extract_to: &Path) -> InstallResult<Vec<PathBuf>> {
    let mut archive = Archive::new(reader);
    archive.set_preserve_permissions(true);

    fs::create_dir_all(extract_to).map_err(|e| {
        InstallError::io(
            format!("Failed to create extraction directory: {}", extract_to.display()),
            e,
        )
    })?;

    let mut extracted_files = Vec::new();

    let entries = archive
        .entries()
        .map_err(|e| InstallError::ExtractionFailed(format!("Failed to read tar.gz entries: {e}")))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| {
            InstallError::ExtractionFailed(format!("Failed to access tar.gz entry: {e}"))
        })?;

        let path = entry
            .path()
            .map_err(|e| InstallError::ExtractionFailed(format!("Invalid entry path: {e}")))?
            .into_owned();

        let unpacked = entry.unpack_in(extract_to).map_err(|e| {
            InstallError::ExtractionFailed(format!("Failed to extract {}: {e}", path.display()))
        })?;

        if unpacked {
            extracted_files.push(extract_to.join(&path));
        } else {
            log::warn!("Skipped archive entry outside destination: {}", path.display());
        }
    }

    log::debug!("Extracted {} tar.gz entries", extracted_files.len());
    Ok(extracted_files)
}
