use crate::error::{InstallError, InstallResult};
use crate::models::{PackageManifest, PlatformDescriptor, PlatformKey};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Optional settings file in the package root
pub const SETTINGS_FILE: &str = "cl-wrangler.toml";
pub const DEFAULT_RELEASE_BASE: &str = "https://github.com/groo-dev/cl-wrangler/releases/download";
pub const MANUAL_INSTALL_URL: &str = "https://github.com/groo-dev/cl-wrangler/releases";
pub const DEFAULT_TAG_PREFIX: &str = "v";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
/// Release version baked in by build.rs
pub const EMBEDDED_VERSION: &str = env!("CL_WRANGLER_RELEASE_VERSION");

pub const ENV_VERSION: &str = "CL_VERSION";
pub const ENV_PLATFORM: &str = "CL_WRANGLER_PLATFORM";
pub const ENV_RELEASE_BASE: &str = "CL_WRANGLER_RELEASE_BASE";
pub const ENV_EXTRACTOR: &str = "CL_WRANGLER_EXTRACTOR";
pub const ENV_TIMEOUT: &str = "CL_WRANGLER_TIMEOUT";
pub const ENV_NO_OPTIMIZE: &str = "CL_WRANGLER_NO_OPTIMIZE";
pub const ENV_TMPDIR: &str = "CL_WRANGLER_TMPDIR";

/// How archives are unpacked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractStrategy {
    /// In-process tar/gzip and zip decoding
    #[default]
    Native,
    /// The OS-native utility (`tar`, `unzip`, PowerShell `Expand-Archive`)
    System,
}

impl FromStr for ExtractStrategy {
    type Err = InstallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "native" => Ok(ExtractStrategy::Native),
            "system" => Ok(ExtractStrategy::System),
            other => Err(InstallError::Config(format!(
                "{ENV_EXTRACTOR} must be 'native' or 'system', got '{other}'"
            ))),
        }
    }
}

/// Contents of `cl-wrangler.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub release_base: Option<String>,
    pub tag_prefix: Option<String>,
    /// Relative paths are taken from the package root
    pub entry_point: Option<PathBuf>,
    pub extractor: Option<ExtractStrategy>,
    /// `0` disables the timeout
    pub timeout_secs: Option<u64>,
    pub optimize: Option<bool>,
    /// Extra directories searched for companion packages
    pub companion_roots: Vec<PathBuf>,
}

impl Settings {
    /// Load the settings file from `package_root`; a missing file yields defaults
    pub fn load(package_root: &Path) -> InstallResult<Self> {
        let path = package_root.join(SETTINGS_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(InstallError::io(
                    format!("Failed to read {}", path.display()),
                    e,
                ));
            }
        };
        toml::from_str(&content)
            .map_err(|e| InstallError::Config(format!("{}: {e}", path.display())))
    }
}

/// Explicit overrides from the install hook's command line
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub version: Option<String>,
    pub entry_point: Option<PathBuf>,
    pub no_optimize: bool,
}

/// Everything a run needs to know, resolved once at startup
#[derive(Debug, Clone)]
pub struct InstallConfig {
    pub platform: PlatformKey,
    pub version: String,
    pub package_root: PathBuf,
    /// The forwarding executable users invoke
    pub entry_point: PathBuf,
    pub release_base: String,
    pub tag_prefix: String,
    pub manual_install_url: String,
    pub temp_dir: PathBuf,
    pub extractor: ExtractStrategy,
    pub timeout: Option<Duration>,
    pub optimize: bool,
    pub companion_roots: Vec<PathBuf>,
}

impl InstallConfig {
    /// Build from the process environment
    pub fn from_env(package_root: PathBuf, overrides: Overrides) -> InstallResult<Self> {
        Self::build(package_root, overrides, |name| std::env::var(name).ok())
    }

    /// Build with an explicit variable lookup.
    ///
    /// Resolution order (highest to lowest priority):
    /// 1. Command line overrides
    /// 2. Environment variables
    /// 3. `cl-wrangler.toml` in the package root
    /// 4. Built-in defaults
    pub fn build<F>(package_root: PathBuf, overrides: Overrides, lookup: F) -> InstallResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let settings = Settings::load(&package_root)?;

        let platform = match lookup(ENV_PLATFORM) {
            Some(value) => value
                .parse::<PlatformKey>()
                .map_err(|e| InstallError::Config(format!("{ENV_PLATFORM}: {e}")))?,
            None => PlatformKey::host(),
        };

        let version = match overrides.version {
            Some(version) => validate_version(&version)?,
            None => resolve_version(&package_root, &lookup)?,
        };

        let entry_point = overrides
            .entry_point
            .or(settings.entry_point)
            .map(|path| package_root.join(path))
            .unwrap_or_else(|| default_entry_point(&package_root, &platform));

        let release_base = lookup(ENV_RELEASE_BASE)
            .or(settings.release_base)
            .unwrap_or_else(|| DEFAULT_RELEASE_BASE.to_string());

        let extractor = match lookup(ENV_EXTRACTOR) {
            Some(value) => value.parse()?,
            None => settings.extractor.unwrap_or_default(),
        };

        let timeout_secs = match lookup(ENV_TIMEOUT) {
            Some(value) => value.trim().parse::<u64>().map_err(|_| {
                InstallError::Config(format!("{ENV_TIMEOUT} must be a number of seconds, got '{value}'"))
            })?,
            None => settings.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        let optimize = !overrides.no_optimize
            && !lookup(ENV_NO_OPTIMIZE).is_some_and(|value| is_truthy(&value))
            && settings.optimize.unwrap_or(true);

        let temp_dir = lookup(ENV_TMPDIR)
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        let companion_roots = settings
            .companion_roots
            .into_iter()
            .map(|path| package_root.join(path))
            .collect();

        Ok(Self {
            platform,
            version,
            entry_point,
            release_base,
            tag_prefix: settings
                .tag_prefix
                .unwrap_or_else(|| DEFAULT_TAG_PREFIX.to_string()),
            manual_install_url: MANUAL_INSTALL_URL.to_string(),
            temp_dir,
            extractor,
            timeout,
            optimize,
            companion_roots,
            package_root,
        })
    }

    /// Directory holding the entry point and the extracted binary
    pub fn bin_dir(&self) -> PathBuf {
        self.package_root.join("bin")
    }

    /// Where this package keeps its own copy of the binary
    pub fn local_binary(&self, descriptor: &PlatformDescriptor) -> PathBuf {
        self.bin_dir().join(descriptor.binary_name)
    }

    /// `<release_base>/<tag_prefix><version>/<archive_name>`
    pub fn download_url(&self, descriptor: &PlatformDescriptor) -> String {
        format!(
            "{}/{}{}/{}",
            self.release_base.trim_end_matches('/'),
            self.tag_prefix,
            self.version,
            descriptor.archive_name
        )
    }
}

/// `<root>/bin/cl-wrangler`, with `.exe` on Windows targets
pub fn default_entry_point(package_root: &Path, platform: &PlatformKey) -> PathBuf {
    let name = if platform.is_windows() {
        "cl-wrangler.exe"
    } else {
        "cl-wrangler"
    };
    package_root.join("bin").join(name)
}

/// `CL_VERSION`, then `package.json`, then the version embedded at build time
pub fn resolve_version<F>(package_root: &Path, lookup: F) -> InstallResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(version) = lookup(ENV_VERSION) {
        return validate_version(&version);
    }
    if let Some(version) = read_manifest_version(package_root) {
        return validate_version(&version);
    }
    validate_version(EMBEDDED_VERSION)
}

fn read_manifest_version(package_root: &Path) -> Option<String> {
    let content = fs::read_to_string(package_root.join("package.json")).ok()?;
    match serde_json::from_str::<PackageManifest>(&content) {
        Ok(manifest) => manifest.version,
        Err(e) => {
            log::debug!("Ignoring unreadable package.json: {e}");
            None
        }
    }
}

fn validate_version(version: &str) -> InstallResult<String> {
    let version = version.trim();
    if version.is_empty() || version.contains(|c: char| c == '/' || c.is_whitespace()) {
        return Err(InstallError::InvalidVersion(version.to_string()));
    }
    Ok(version.to_string())
}

fn is_truthy(value: &str) -> bool {
    !matches!(value.trim().to_lowercase().as_str(), "0" | "false" | "no" | "off")
}
