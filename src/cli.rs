use crate::config::{self, InstallConfig, Overrides};
use crate::download::HttpFetcher;
use crate::error::InstallError;
use crate::install::{Installer, report_failure};
use crate::logging::init_logger;
use crate::models::{InstallArgs, InstallReport};
use crate::runner::{self, Launcher, NOT_FOUND_MESSAGE, REINSTALL_HINT};
use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

/// Environment variable naming the package root for the install hook
pub const ENV_ROOT: &str = "CL_WRANGLER_ROOT";

/// Entry point of `cl-wrangler-install`
pub fn run_installer() -> ExitCode {
    let args = InstallArgs::parse();
    init_logger(if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    match install(args) {
        Ok(report) => {
            log::debug!("Install finished: {report:?}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            report_failure(config::MANUAL_INSTALL_URL, &format!("{err:#}"));
            ExitCode::from(1)
        }
    }
}

fn install(args: InstallArgs) -> Result<InstallReport> {
    let root = match args.root {
        Some(root) => root,
        None => default_package_root().context("Failed to determine the package root")?,
    };
    let overrides = Overrides {
        version: args.release,
        entry_point: args.entry_point,
        no_optimize: args.no_optimize,
    };
    let config = InstallConfig::from_env(root, overrides)
        .context("Failed to load installer configuration")?;
    log::debug!("Resolved configuration: {config:?}");

    let report = Installer::new(&config, HttpFetcher::new(config.timeout))
        .force(args.force)
        .install()?;
    Ok(report)
}

/// `CL_WRANGLER_ROOT`, else the directory above this executable's `bin/`
fn default_package_root() -> Result<PathBuf, InstallError> {
    if let Some(root) = std::env::var_os(ENV_ROOT).filter(|root| !root.is_empty()) {
        return Ok(PathBuf::from(root));
    }
    let exe = runner::current_exe()?;
    runner::package_root_of(&exe).ok_or_else(|| {
        InstallError::Config(format!("{} is not inside a bin/ directory", exe.display()))
    })
}

/// Entry point of the `cl-wrangler` launcher. Returns the exit code to use.
pub fn run_launcher<I>(args: I) -> i32
where
    I: IntoIterator<Item = OsString>,
{
    init_logger(LevelFilter::Info);

    // Identify the launcher before a first-run install can optimize its file away
    let launcher = match Launcher::current() {
        Ok(launcher) => launcher,
        Err(err) => {
            report_failure(config::MANUAL_INSTALL_URL, &err);
            return 1;
        }
    };
    let config = match launcher_config(&launcher) {
        Ok(config) => config,
        Err(err) => {
            report_failure(config::MANUAL_INSTALL_URL, &err);
            return 1;
        }
    };

    let binary = match runner::resolve_binary(&config) {
        Ok(binary) => binary,
        Err(err @ InstallError::UnsupportedPlatform(_)) => {
            eprintln!("{err}");
            eprintln!("Please install manually from: {}", config.manual_install_url);
            return 1;
        }
        Err(err) => {
            report_failure(&config.manual_install_url, &err);
            eprintln!("{NOT_FOUND_MESSAGE}");
            eprintln!("{REINSTALL_HINT}");
            return 1;
        }
    };

    match launcher.forward(&binary, args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[cl-wrangler] {err}");
            1
        }
    }
}

/// Configuration for a launcher at `<root>/bin/<exe>`; the launcher itself is the entry point
fn launcher_config(launcher: &Launcher) -> Result<InstallConfig, InstallError> {
    let overrides = Overrides {
        entry_point: Some(launcher.exe.clone()),
        ..Default::default()
    };
    InstallConfig::from_env(launcher.package_root.clone(), overrides)
}
