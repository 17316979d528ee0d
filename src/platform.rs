use crate::error::{InstallError, InstallResult};
use crate::models::{ArchiveFormat, PlatformDescriptor, PlatformKey};

struct PlatformEntry {
    os: &'static str,
    arch: &'static str,
    archive_name: &'static str,
    companion_package: Option<&'static str>,
}

const PLATFORMS: &[PlatformEntry] = &[
    PlatformEntry {
        os: "darwin",
        arch: "arm64",
        archive_name: "cl_darwin_arm64.tar.gz",
        companion_package: Some("@groo.dev/cl-wrangler-darwin-arm64"),
    },
    PlatformEntry {
        os: "darwin",
        arch: "x64",
        archive_name: "cl_darwin_amd64.tar.gz",
        companion_package: Some("@groo.dev/cl-wrangler-darwin-x64"),
    },
    PlatformEntry {
        os: "linux",
        arch: "arm64",
        archive_name: "cl_linux_arm64.tar.gz",
        companion_package: Some("@groo.dev/cl-wrangler-linux-arm64"),
    },
    PlatformEntry {
        os: "linux",
        arch: "x64",
        archive_name: "cl_linux_amd64.tar.gz",
        companion_package: Some("@groo.dev/cl-wrangler-linux-x64"),
    },
    PlatformEntry {
        os: "win32",
        arch: "arm64",
        archive_name: "cl_windows_arm64.zip",
        companion_package: Some("@groo.dev/cl-wrangler-win32-arm64"),
    },
    PlatformEntry {
        os: "win32",
        arch: "x64",
        archive_name: "cl_windows_amd64.zip",
        companion_package: Some("@groo.dev/cl-wrangler-win32-x64"),
    },
];

/// Binary file name for an OS family
pub fn binary_name(os: &str) -> &'static str {
    if os == "win32" { "cl.exe" } else { "cl" }
}

/// Look up the release facts for a platform.
///
/// Fails with [`InstallError::UnsupportedPlatform`] carrying the literal
/// `os-arch` string for anything outside the supported set.
pub fn resolve(key: &PlatformKey) -> InstallResult<PlatformDescriptor> {
    let entry = PLATFORMS
        .iter()
        .find(|entry| entry.os == key.os && entry.arch == key.arch)
        .ok_or_else(|| {
            let known: Vec<String> = supported().map(|key| key.to_string()).collect();
            log::debug!("Supported platforms: {}", known.join(", "));
            InstallError::UnsupportedPlatform(key.to_string())
        })?;

    let format = if entry.archive_name.ends_with(".zip") {
        ArchiveFormat::Zip
    } else {
        ArchiveFormat::TarGz
    };

    Ok(PlatformDescriptor {
        key: key.clone(),
        archive_name: entry.archive_name,
        format,
        companion_package: entry.companion_package,
        binary_name: binary_name(entry.os),
    })
}

/// Every supported platform key
pub fn supported() -> impl Iterator<Item = PlatformKey> {
    PLATFORMS
        .iter()
        .map(|entry| PlatformKey::new(entry.os, entry.arch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_supported_key_resolves() {
        let keys: Vec<_> = supported().collect();
        assert_eq!(keys.len(), 6);

        for key in keys {
            let descriptor = resolve(&key).unwrap();
            assert!(!descriptor.archive_name.is_empty());
            assert!(!descriptor.binary_name.is_empty());
            assert!(descriptor.companion_package.is_some());
            assert_eq!(descriptor.key, key);
        }
    }

    #[test]
    fn test_windows_uses_zip_and_exe() {
        let descriptor = resolve(&PlatformKey::new("win32", "x64")).unwrap();
        assert_eq!(descriptor.archive_name, "cl_windows_amd64.zip");
        assert_eq!(descriptor.format, ArchiveFormat::Zip);
        assert_eq!(descriptor.binary_name, "cl.exe");
        assert!(descriptor.is_windows());
    }

    #[test]
    fn test_unix_uses_tar_gz() {
        let descriptor = resolve(&PlatformKey::new("linux", "x64")).unwrap();
        assert_eq!(descriptor.archive_name, "cl_linux_amd64.tar.gz");
        assert_eq!(descriptor.format, ArchiveFormat::TarGz);
        assert_eq!(descriptor.binary_name, "cl");
        assert_eq!(
            descriptor.companion_package,
            Some("@groo.dev/cl-wrangler-linux-x64")
        );

        let descriptor = resolve(&PlatformKey::new("darwin", "arm64")).unwrap();
        assert_eq!(descriptor.archive_name, "cl_darwin_arm64.tar.gz");
    }

    #[test]
    fn test_unsupported_platform_reports_literal_key() {
        for key in ["freebsd-x64", "linux-ia32", "darwin-ppc64", "sunos-arm64"] {
            let key: PlatformKey = key.parse().unwrap();
            match resolve(&key) {
                Err(InstallError::UnsupportedPlatform(reported)) => {
                    assert_eq!(reported, key.to_string())
                }
                other => panic!("expected UnsupportedPlatform for {key}, got {other:?}"),
            }
        }
    }
}
