use crate::error::{InstallError, InstallResult};
use crate::install::executable::FileId;
use fs4::fs_std::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

pub const LOCK_FILE: &str = ".cl-wrangler.lock";

/// Advisory exclusive lock serialising installs into one `bin/` directory.
/// The lock file is removed on drop, so only the binary and entry point stay
/// behind in `bin/`.
#[derive(Debug)]
pub struct InstallLock {
    file: File,
    path: PathBuf,
}

impl InstallLock {
    /// Block until the lock for `bin_dir` is held
    pub fn acquire(bin_dir: &Path) -> InstallResult<Self> {
        fs::create_dir_all(bin_dir).map_err(|e| {
            InstallError::io(format!("Failed to create directory: {}", bin_dir.display()), e)
        })?;

        let path = bin_dir.join(LOCK_FILE);
        loop {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&path)
                .map_err(|e| {
                    InstallError::io(format!("Failed to open lock file: {}", path.display()), e)
                })?;

            file.lock_exclusive().map_err(|e| {
                InstallError::io(format!("Failed to lock {}", path.display()), e)
            })?;

            if is_current_lock_file(&file, &path) {
                log::debug!("Holding install lock {}", path.display());
                return Ok(Self { file, path });
            }
            // The previous holder removed the file while we waited on it
            log::debug!("Lock file {} was replaced, retrying", path.display());
        }
    }
}

/// The locked handle still names the file at `path`
fn is_current_lock_file(file: &File, path: &Path) -> bool {
    if cfg!(not(unix)) {
        return true;
    }
    let Ok(metadata) = file.metadata() else {
        return false;
    };
    match FileId::from_metadata(path, &metadata) {
        Some(locked) => FileId::of(path) == Some(locked),
        None => false,
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        // Unlink before unlocking; waiters on the old file notice and retry
        if let Err(e) = fs::remove_file(&self.path) {
            log::debug!("Failed to remove {}: {e}", self.path.display());
        }
        if let Err(e) = FileExt::unlock(&self.file) {
            log::debug!("Failed to release {}: {e}", self.path.display());
        }
    }
}
