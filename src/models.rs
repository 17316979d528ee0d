use clap::Parser;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Command line arguments of the install hook
#[derive(Parser, Debug)]
#[command(
    name = "cl-wrangler-install",
    author,
    version,
    about = "Install the cl binary for this platform",
    long_about = None
)]
pub struct InstallArgs {
    /// Package root containing bin/ (defaults to the parent of this executable's directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
    /// Entry point to replace with the binary once installed (relative to the package root)
    #[arg(long = "entry-point", value_name = "PATH")]
    pub entry_point: Option<PathBuf>,
    /// Release version to download (overrides CL_VERSION and package.json)
    #[arg(long, value_name = "VERSION")]
    pub release: Option<String>,
    /// Download even if a binary is already present
    #[arg(long)]
    pub force: bool,
    /// Keep the forwarding entry point instead of replacing it with the binary
    #[arg(long)]
    pub no_optimize: bool,
    /// Show debug output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Host identity as `(os, arch)` in the vocabulary release archives and
/// companion packages are named with (`darwin`/`linux`/`win32`, `x64`/`arm64`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformKey {
    pub os: String,
    pub arch: String,
}

impl PlatformKey {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Platform of the running process. Unknown values pass through unchanged
    /// so they can be reported verbatim.
    pub fn host() -> Self {
        Self::new(
            normalize_os(std::env::consts::OS),
            normalize_arch(std::env::consts::ARCH),
        )
    }

    pub fn is_windows(&self) -> bool {
        self.os == "win32"
    }
}

fn normalize_os(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}

fn normalize_arch(arch: &str) -> &str {
    match arch {
        "x86_64" | "amd64" => "x64",
        "aarch64" => "arm64",
        other => other,
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

impl FromStr for PlatformKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (os, arch) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("expected <os>-<arch>, got '{s}'"))?;
        if os.is_empty() || arch.is_empty() {
            return Err(format!("expected <os>-<arch>, got '{s}'"));
        }
        Ok(Self::new(
            normalize_os(&os.to_lowercase()),
            normalize_arch(&arch.to_lowercase()),
        ))
    }
}

/// Container format of a release archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

impl ArchiveFormat {
    /// File suffix, used for spooled temp files so external tools recognise them
    pub fn suffix(self) -> &'static str {
        match self {
            ArchiveFormat::TarGz => ".tar.gz",
            ArchiveFormat::Zip => ".zip",
        }
    }
}

/// Static facts about one supported platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDescriptor {
    pub key: PlatformKey,
    /// Asset name on the release page
    pub archive_name: &'static str,
    pub format: ArchiveFormat,
    /// Optional dependency that ships a prebuilt binary for this platform
    pub companion_package: Option<&'static str>,
    /// `cl` or `cl.exe`
    pub binary_name: &'static str,
}

impl PlatformDescriptor {
    pub fn is_windows(&self) -> bool {
        self.key.is_windows()
    }
}

/// Where a usable binary came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinarySource {
    /// Already present in the package's own `bin/`
    Local,
    /// Shipped by the named companion package
    Companion(String),
    /// Fetched from the release server during this run
    Downloaded,
}

/// Result of locating or installing the binary for this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationState {
    pub binary_path: PathBuf,
    pub already_present: bool,
    pub source: BinarySource,
}

/// What the wrapper optimizer did. Never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptimizeOutcome {
    Optimized,
    AlreadyOptimized,
    Skipped(&'static str),
    Failed(String),
}

/// Outcome of a successful installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub state: InstallationState,
    pub optimization: OptimizeOutcome,
}

/// The fields of `package.json` the installer cares about
#[derive(Debug, Deserialize, Default)]
pub struct PackageManifest {
    pub name: Option<String>,
    pub version: Option<String>,
}
