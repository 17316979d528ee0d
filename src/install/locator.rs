use crate::config::InstallConfig;
use crate::models::{BinarySource, InstallationState, PlatformDescriptor};
use std::path::{Path, PathBuf};

/// Find a ready-to-run binary without touching the network.
///
/// Checks the package's own `bin/` first, then the platform's companion
/// package. `None` means "download it"; it is never an error.
pub fn locate(config: &InstallConfig, descriptor: &PlatformDescriptor) -> Option<InstallationState> {
    let local = config.local_binary(descriptor);
    if local.is_file() {
        return Some(InstallationState {
            binary_path: local,
            already_present: true,
            source: BinarySource::Local,
        });
    }

    let package = descriptor.companion_package?;
    let binary_path = companion_binary(config, package, descriptor.binary_name)?;
    Some(InstallationState {
        binary_path,
        already_present: true,
        source: BinarySource::Companion(package.to_string()),
    })
}

/// Path of the binary inside the companion package, if the package is installed
pub fn companion_binary(config: &InstallConfig, package: &str, binary_name: &str) -> Option<PathBuf> {
    let package_dir = resolve_package_dir(&config.package_root, &config.companion_roots, package)?;
    let binary = package_dir.join("bin").join(binary_name);
    if binary.is_file() {
        Some(binary)
    } else {
        log::debug!(
            "Companion package {package} at {} has no {}",
            package_dir.display(),
            binary.display()
        );
        None
    }
}

/// Resolve an installed package the way Node does: `node_modules/<package>`
/// in the package root and each of its ancestors, then any extra roots.
fn resolve_package_dir(start: &Path, extra_roots: &[PathBuf], package: &str) -> Option<PathBuf> {
    let relative: PathBuf = package.split('/').collect();

    let node_candidates = start
        .ancestors()
        .map(|dir| dir.join("node_modules").join(&relative));
    let extra_candidates = extra_roots.iter().map(|root| root.join(&relative));

    node_candidates
        .chain(extra_candidates)
        .find(|candidate| candidate.join("package.json").is_file())
}
