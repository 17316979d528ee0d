use crate::config::InstallConfig;
use crate::download::HttpFetcher;
use crate::error::{InstallError, InstallResult, LaunchError};
use crate::install::executable::FileId;
use crate::install::{Installer, locator};
use crate::platform;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Printed when no binary can be found or installed
pub const NOT_FOUND_MESSAGE: &str = "cl binary not found. Please reinstall the package.";
pub const REINSTALL_HINT: &str = "Run: npm install -g @groo.dev/cl-wrangler";

/// Binary the launcher should hand off to, installing it on first use
pub fn resolve_binary(config: &InstallConfig) -> Result<PathBuf, InstallError> {
    let descriptor = platform::resolve(&config.platform)?;
    if let Some(state) = locator::locate(config, &descriptor) {
        return Ok(state.binary_path);
    }

    log::info!("cl binary not installed yet, installing now");
    let report = Installer::new(config, HttpFetcher::new(config.timeout)).install()?;
    Ok(report.state.binary_path)
}

/// The running launcher, identified before an install can replace its file
#[derive(Debug, Clone)]
pub struct Launcher {
    /// Real location of the launcher, symlinks resolved
    pub exe: PathBuf,
    pub package_root: PathBuf,
    identity: Option<FileId>,
}

impl Launcher {
    pub fn current() -> InstallResult<Self> {
        Self::at(&current_exe()?)
    }

    /// Launcher at `exe`, which may be a symlink such as a global npm bin link
    pub fn at(exe: &Path) -> InstallResult<Self> {
        let exe = fs::canonicalize(exe)
            .map_err(|e| InstallError::io(format!("Failed to resolve {}", exe.display()), e))?;
        let package_root = package_root_of(&exe).ok_or_else(|| {
            InstallError::Config(format!("{} is not inside a bin/ directory", exe.display()))
        })?;
        let identity = FileId::of(&exe);
        Ok(Self {
            exe,
            package_root,
            identity,
        })
    }

    /// Run `binary` with `args` and inherited stdio, returning its exit code.
    /// A child without an exit code (killed by a signal) maps to 1.
    ///
    /// `binary` is refused only if it is the file this launcher was started
    /// from. An entry point optimized into a link to `binary` since then is fine.
    pub fn forward<I, S>(&self, binary: &Path, args: I) -> Result<i32, LaunchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        if self.identity.is_some() && self.identity == FileId::of(binary) {
            return Err(LaunchError::SelfReference(binary.to_path_buf()));
        }
        run(binary, args)
    }
}

fn run<I, S>(binary: &Path, args: I) -> Result<i32, LaunchError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let status = Command::new(binary)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|source| LaunchError::Spawn {
            path: binary.to_path_buf(),
            source,
        })?;

    Ok(status.code().unwrap_or(1))
}

/// Path of the running executable with symlinks resolved
pub fn current_exe() -> InstallResult<PathBuf> {
    let exe = std::env::current_exe()
        .map_err(|e| InstallError::io("Failed to locate the running executable", e))?;
    fs::canonicalize(&exe)
        .map_err(|e| InstallError::io(format!("Failed to resolve {}", exe.display()), e))
}

/// Package root for a launcher living at `<root>/bin/<exe>`
pub fn package_root_of(exe: &Path) -> Option<PathBuf> {
    exe.parent()?.parent().map(Path::to_path_buf)
}
