use crate::error::{InstallError, InstallResult};
use std::fs;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Extract ZIP archive, returns list of extracted file paths
pub fn extract_zip(zip_path: &Path, extract_to: &Path) -> InstallResult<Vec<PathBuf>> {
    let file = fs::File::open(zip_path).map_err(|e| {
        InstallError::io(format!("Failed to open zip file: {}", zip_path.display()), e)
    })?;

    let mut archive = ZipArchive::new(file)
        .map_err(|e| InstallError::ExtractionFailed(format!("Failed to read zip archive: {e}")))?;

    fs::create_dir_all(extract_to).map_err(|e| {
        InstallError::io(
            format!("Failed to create extraction directory: {}", extract_to.display()),
            e,
        )
    })?;

    let mut extracted_files = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|e| {
            InstallError::ExtractionFailed(format!("Failed to access zip entry {i}: {e}"))
        })?;

        let Some(relative) = file.enclosed_name().map(Path::to_path_buf) else {
            log::warn!("Skipped archive entry outside destination: {}", file.name());
            continue;
        };
        let outpath = extract_to.join(relative);

        if file.is_dir() {
            fs::create_dir_all(&outpath).map_err(|e| {
                InstallError::io(format!("Failed to create directory: {}", outpath.display()), e)
            })?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                InstallError::io(
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }

        let mut outfile = fs::File::create(&outpath).map_err(|e| {
            InstallError::io(
                format!("Failed to create extracted file: {}", outpath.display()),
                e,
            )
        })?;
        std::io::copy(&mut file, &mut outfile).map_err(|e| {
            InstallError::ExtractionFailed(format!(
                "Failed to extract file {}: {e}",
                outpath.display()
            ))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                fs::set_permissions(&outpath, fs::Permissions::from_mode(mode)).map_err(|e| {
                    InstallError::io(
                        format!("Failed to set permissions on {}", outpath.display()),
                        e,
                    )
                })?;
            }
        }

        extracted_files.push(outpath);
    }

    log::debug!("Extracted {} zip entries", extracted_files.len());
    Ok(extracted_files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;

    fn build_zip(path: &Path, files: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, data) in files {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_extract_zip() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("cl.zip");
        build_zip(&archive, &[("cl.exe", b"MZ"), ("LICENSE", b"MIT")]);

        let dest = temp.path().join("out");
        let files = extract_zip(&archive, &dest).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(fs::read(dest.join("cl.exe")).unwrap(), b"MZ");
        assert_eq!(fs::read(dest.join("LICENSE")).unwrap(), b"MIT");
    }

    #[test]
    fn test_extract_zip_skips_escaping_entries() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("evil.zip");
        build_zip(&archive, &[("../escape.txt", b"nope"), ("cl.exe", b"MZ")]);

        let dest = temp.path().join("out");
        let files = extract_zip(&archive, &dest).unwrap();

        assert_eq!(files, vec![dest.join("cl.exe")]);
        assert!(!temp.path().join("escape.txt").exists());
    }

    #[test]
    fn test_extract_corrupt_zip_fails() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.zip");
        fs::write(&archive, b"PK but not really").unwrap();

        let result = extract_zip(&archive, &temp.path().join("out"));
        assert!(matches!(result, Err(InstallError::ExtractionFailed(_))));
    }
}
