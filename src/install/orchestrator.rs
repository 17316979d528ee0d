use crate::archive::{self, Archive, utils::find_file_named};
use crate::config::InstallConfig;
use crate::download::Fetch;
use crate::error::{InstallError, InstallResult};
use crate::install::executable::{is_executable, make_executable};
use crate::install::lock::InstallLock;
use crate::install::{locator, optimize};
use crate::models::{
    BinarySource, InstallReport, InstallationState, OptimizeOutcome, PlatformDescriptor,
};
use crate::platform;
use std::fs;
use std::path::{Path, PathBuf};

/// Sequences locate, download, extract, permission fix and optimize
pub struct Installer<'a, F: Fetch> {
    config: &'a InstallConfig,
    fetcher: F,
    force: bool,
}

impl<'a, F: Fetch> Installer<'a, F> {
    pub fn new(config: &'a InstallConfig, fetcher: F) -> Self {
        Self {
            config,
            fetcher,
            force: false,
        }
    }

    /// Download even when a usable binary is already present
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn install(&self) -> InstallResult<InstallReport> {
        let descriptor = platform::resolve(&self.config.platform)?;

        if !self.force
            && let Some(state) = locator::locate(self.config, &descriptor)
        {
            match &state.source {
                BinarySource::Companion(package) => {
                    log::info!("Found binary in platform package {package}")
                }
                _ => log::info!("cl binary already exists at {}", state.binary_path.display()),
            }
            if state.source == BinarySource::Local && !descriptor.is_windows() {
                self.ensure_executable(&state.binary_path)?;
            }
            return Ok(self.finish(state, &descriptor));
        }

        if !self.force {
            log::info!("Platform package not found, downloading binary...");
            log::info!("This can happen if you used --no-optional or --ignore-optional");
        }

        let state = self.download_and_install(&descriptor)?;
        Ok(self.finish(state, &descriptor))
    }

    fn download_and_install(&self, descriptor: &PlatformDescriptor) -> InstallResult<InstallationState> {
        let bin_dir = self.config.bin_dir();
        let _lock = InstallLock::acquire(&bin_dir)?;

        // Another process may have finished while we waited for the lock
        let target = self.config.local_binary(descriptor);
        if !self.force && target.is_file() {
            log::info!("cl binary was installed concurrently, skipping download");
            return Ok(InstallationState {
                binary_path: target,
                already_present: true,
                source: BinarySource::Local,
            });
        }

        let url = self.config.download_url(descriptor);
        log::info!(
            "Downloading cl v{} for {} from {url}",
            self.config.version,
            descriptor.key
        );
        let bytes = self.fetcher.fetch(&url)?;
        let archive = Archive::new(bytes, descriptor.format);
        if archive.is_empty() {
            return Err(InstallError::ExtractionFailed(format!("{url} returned an empty archive")));
        }
        log::debug!("Fetched {} bytes ({:?})", archive.len(), archive.format());

        let binary_path = self.extract_into_place(archive, &bin_dir, descriptor)?;

        if !descriptor.is_windows() {
            make_executable(&binary_path)?;
        }

        log::info!("cl v{} installed successfully!", self.config.version);
        Ok(InstallationState {
            binary_path,
            already_present: false,
            source: BinarySource::Downloaded,
        })
    }

    /// Extract into a staging directory inside `bin_dir`, then move the binary
    /// to its final name so a failed extraction never leaves a partial binary
    fn extract_into_place(
        &self,
        archive: Archive,
        bin_dir: &Path,
        descriptor: &PlatformDescriptor,
    ) -> InstallResult<PathBuf> {
        let staging = tempfile::Builder::new()
            .prefix(".cl-stage-")
            .tempdir_in(bin_dir)
            .map_err(|e| {
                InstallError::io(
                    format!("Failed to create staging directory in {}", bin_dir.display()),
                    e,
                )
            })?;

        archive::extract(
            archive,
            staging.path(),
            &self.config.temp_dir,
            self.config.extractor,
        )?;

        let extracted = find_file_named(staging.path(), descriptor.binary_name)
            .map_err(|e| InstallError::io("Failed to scan extracted archive", e))?
            .ok_or_else(|| InstallError::BinaryMissing(PathBuf::from(descriptor.binary_name)))?;

        let target = bin_dir.join(descriptor.binary_name);
        if target.exists() {
            fs::remove_file(&target).map_err(|e| {
                InstallError::io(format!("Failed to replace {}", target.display()), e)
            })?;
        }
        fs::rename(&extracted, &target).map_err(|e| {
            InstallError::io(format!("Failed to move binary to {}", target.display()), e)
        })?;

        Ok(target)
    }

    /// Restore the executable bits on a binary found already in `bin/`
    fn ensure_executable(&self, binary: &Path) -> InstallResult<()> {
        let executable = is_executable(binary).map_err(|e| {
            InstallError::io(format!("Failed to inspect {}", binary.display()), e)
        })?;
        if !executable {
            log::debug!("Marking {} executable", binary.display());
            make_executable(binary)?;
        }
        Ok(())
    }

    fn finish(&self, state: InstallationState, descriptor: &PlatformDescriptor) -> InstallReport {
        let optimization = if self.config.optimize {
            optimize::optimize(&state.binary_path, &self.config.entry_point, descriptor)
        } else {
            OptimizeOutcome::Skipped("disabled by configuration")
        };

        match &optimization {
            OptimizeOutcome::Optimized => log::info!("Optimized: replaced wrapper with binary"),
            OptimizeOutcome::Failed(reason) => log::debug!("Optimization skipped: {reason}"),
            OptimizeOutcome::AlreadyOptimized | OptimizeOutcome::Skipped(_) => {}
        }

        InstallReport {
            state,
            optimization,
        }
    }
}

/// Print a fatal installation error with the manual fallback location
pub fn report_failure(manual_install_url: &str, error: &dyn std::fmt::Display) {
    eprintln!("[cl-wrangler] Installation failed: {error}");
    eprintln!("[cl-wrangler] You can install manually from: {manual_install_url}");
}
