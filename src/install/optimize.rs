use crate::install::executable::same_file;
use crate::models::{OptimizeOutcome, PlatformDescriptor};
use std::fs;
use std::path::{Path, PathBuf};

/// Temporary hard-link name beside the entry point, unique per process
pub fn temp_link_path(entry_point: &Path) -> PathBuf {
    let name = entry_point
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cl-wrangler".to_string());
    entry_point.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

/// Replace the forwarding entry point with a hard link to the binary so later
/// invocations start the binary directly.
///
/// Best effort: on any failure the entry point is left as it was and the
/// reason comes back as [`OptimizeOutcome::Failed`].
pub fn optimize(binary: &Path, entry_point: &Path, descriptor: &PlatformDescriptor) -> OptimizeOutcome {
    if descriptor.is_windows() || cfg!(windows) {
        return OptimizeOutcome::Skipped("hard links are not used on Windows");
    }
    if !entry_point.exists() {
        return OptimizeOutcome::Skipped("entry point not found");
    }
    if same_file(binary, entry_point) {
        return OptimizeOutcome::AlreadyOptimized;
    }

    swap_in_hard_link(binary, entry_point, &temp_link_path(entry_point))
}

/// Link `binary` at `temp_link`, then rename it over `entry_point`
fn swap_in_hard_link(binary: &Path, entry_point: &Path, temp_link: &Path) -> OptimizeOutcome {
    if let Err(e) = fs::hard_link(binary, temp_link) {
        return OptimizeOutcome::Failed(format!(
            "could not link {} to {}: {e}",
            binary.display(),
            temp_link.display()
        ));
    }

    match fs::rename(temp_link, entry_point) {
        Ok(()) => OptimizeOutcome::Optimized,
        Err(e) => {
            let _ = fs::remove_file(temp_link);
            OptimizeOutcome::Failed(format!(
                "could not replace {}: {e}",
                entry_point.display()
            ))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::models::PlatformKey;
    use crate::platform;
    use tempfile::TempDir;

    fn linux() -> PlatformDescriptor {
        platform::resolve(&PlatformKey::new("linux", "x64")).unwrap()
    }

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let temp = TempDir::new().unwrap();
        let bin = temp.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        let binary = bin.join("cl");
        let entry = bin.join("cl-wrangler");
        fs::write(&binary, "real binary").unwrap();
        fs::write(&entry, "launcher").unwrap();
        (temp, binary, entry)
    }

    #[test]
    fn test_optimize_replaces_entry_point() {
        let (_temp, binary, entry) = setup();

        assert_eq!(optimize(&binary, &entry, &linux()), OptimizeOutcome::Optimized);
        assert!(same_file(&binary, &entry));
        assert_eq!(fs::read_to_string(&entry).unwrap(), "real binary");
        assert!(!temp_link_path(&entry).exists());
    }

    #[test]
    fn test_optimize_twice_is_noop() {
        let (_temp, binary, entry) = setup();

        optimize(&binary, &entry, &linux());
        assert_eq!(
            optimize(&binary, &entry, &linux()),
            OptimizeOutcome::AlreadyOptimized
        );
    }

    #[test]
    fn test_optimize_skips_windows_target() {
        let (_temp, binary, entry) = setup();
        let windows = platform::resolve(&PlatformKey::new("win32", "x64")).unwrap();

        assert!(matches!(
            optimize(&binary, &entry, &windows),
            OptimizeOutcome::Skipped(_)
        ));
        assert_eq!(fs::read_to_string(&entry).unwrap(), "launcher");
    }

    #[test]
    fn test_optimize_skips_missing_entry_point() {
        let (temp, binary, _entry) = setup();
        let missing = temp.path().join("bin").join("nope");

        assert!(matches!(
            optimize(&binary, &missing, &linux()),
            OptimizeOutcome::Skipped(_)
        ));
        assert!(!missing.exists());
    }

    #[test]
    fn test_link_failure_leaves_entry_point_and_foreign_file() {
        let (_temp, binary, entry) = setup();
        // Someone else's file already occupies the temp name
        let temp_link = temp_link_path(&entry);
        fs::write(&temp_link, "not ours").unwrap();

        let outcome = optimize(&binary, &entry, &linux());

        assert!(matches!(outcome, OptimizeOutcome::Failed(_)));
        assert_eq!(fs::read_to_string(&entry).unwrap(), "launcher");
        assert_eq!(fs::read_to_string(&temp_link).unwrap(), "not ours");
    }

    #[test]
    fn test_rename_failure_removes_temp_link() {
        let (temp, binary, _entry) = setup();
        // A non-empty directory cannot be replaced by a file
        let entry = temp.path().join("bin").join("occupied");
        fs::create_dir_all(entry.join("child")).unwrap();

        let outcome = optimize(&binary, &entry, &linux());

        assert!(matches!(outcome, OptimizeOutcome::Failed(_)));
        assert!(entry.join("child").is_dir());
        assert!(!temp_link_path(&entry).exists());
    }
}
