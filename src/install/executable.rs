use crate::error::{InstallError, InstallResult};
use std::fs::{self, Metadata};
use std::path::Path;

/// Identity of a file on disk, independent of the path it was reached through.
///
/// Captured once, it keeps naming the original file even after a rename or
/// hard link moves a different file to the same path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileId(Identity);

#[cfg(unix)]
type Identity = (u64, u64);

#[cfg(not(unix))]
type Identity = std::path::PathBuf;

impl FileId {
    /// Identity of whatever `path` names right now, following symlinks
    pub fn of(path: &Path) -> Option<Self> {
        let metadata = fs::metadata(path).ok()?;
        Self::from_metadata(path, &metadata)
    }

    #[cfg(unix)]
    pub fn from_metadata(_path: &Path, metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self((metadata.dev(), metadata.ino())))
    }

    #[cfg(not(unix))]
    pub fn from_metadata(path: &Path, _metadata: &Metadata) -> Option<Self> {
        path.canonicalize().ok().map(Self)
    }
}

/// Check if a file is executable
pub fn is_executable(path: &Path) -> std::io::Result<bool> {
    let metadata = fs::metadata(path)?;

    if !metadata.is_file() {
        return Ok(false);
    }

    #[cfg(windows)]
    {
        Ok(path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("exe")))
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = metadata.permissions().mode();
        Ok(mode & 0o111 != 0)
    }
}

/// Mark `path` as `rwxr-xr-x`. No-op where there is no executable bit.
pub fn make_executable(path: &Path) -> InstallResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|e| {
            InstallError::io(
                format!("Failed to set executable permissions on {}", path.display()),
                e,
            )
        })?;
    }

    #[cfg(not(unix))]
    {
        if !path.is_file() {
            return Err(InstallError::BinaryMissing(path.to_path_buf()));
        }
    }

    Ok(())
}

/// True when both paths name the same file (hard links included)
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (FileId::of(a), FileId::of(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
