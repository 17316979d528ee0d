use crate::error::{InstallError, InstallResult};
use crate::models::ArchiveFormat;
use std::path::Path;
use std::process::Command;

/// Build the OS-native extraction command for an archive file
fn extraction_command(format: ArchiveFormat, archive_path: &Path, extract_to: &Path) -> Command {
    match format {
        ArchiveFormat::TarGz => {
            let mut cmd = Command::new("tar");
            cmd.arg("-xzf").arg(archive_path).arg("-C").arg(extract_to);
            cmd
        }
        ArchiveFormat::Zip if cfg!(windows) => {
            let mut cmd = Command::new("powershell");
            cmd.arg("-NoProfile").arg("-NonInteractive").arg("-Command").arg(format!(
                "Expand-Archive -Path '{}' -DestinationPath '{}' -Force",
                archive_path.display(),
                extract_to.display()
            ));
            cmd
        }
        ArchiveFormat::Zip => {
            let mut cmd = Command::new("unzip");
            cmd.arg("-o").arg("-q").arg(archive_path).arg("-d").arg(extract_to);
            cmd
        }
    }
}

/// Extract with the platform's own tools. A non-zero exit is `ExtractionFailed`.
pub fn extract_with_system_tool(
    format: ArchiveFormat,
    archive_path: &Path,
    extract_to: &Path,
) -> InstallResult<()> {
    let mut cmd = extraction_command(format, archive_path, extract_to);
    let program = cmd.get_program().to_string_lossy().into_owned();
    log::debug!("Running {program} to extract {}", archive_path.display());

    let output = cmd
        .output()
        .map_err(|e| InstallError::ExtractionFailed(format!("Failed to run {program}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(InstallError::ExtractionFailed(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tar_command_shape() {
        let cmd = extraction_command(
            ArchiveFormat::TarGz,
            Path::new("/tmp/cl-1.tar.gz"),
            Path::new("/opt/cl/bin"),
        );
        assert_eq!(cmd.get_program(), "tar");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, ["-xzf", "/tmp/cl-1.tar.gz", "-C", "/opt/cl/bin"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_zip_command_uses_unzip() {
        let cmd = extraction_command(
            ArchiveFormat::Zip,
            Path::new("/tmp/cl-1.zip"),
            Path::new("/opt/cl/bin"),
        );
        assert_eq!(cmd.get_program(), "unzip");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_tool_is_extraction_failed() {
        let temp = tempfile::TempDir::new().unwrap();
        let archive = temp.path().join("broken.tar.gz");
        std::fs::write(&archive, b"not an archive").unwrap();

        let result = extract_with_system_tool(ArchiveFormat::TarGz, &archive, temp.path());
        assert!(matches!(result, Err(InstallError::ExtractionFailed(_))));
    }
}
