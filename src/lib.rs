// Public modules
pub mod archive;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod install;
pub mod logging;
pub mod models;
pub mod platform;
pub mod runner;

// Re-export commonly used types
pub use config::InstallConfig;
pub use error::{InstallError, InstallResult, LaunchError};
pub use install::Installer;
pub use models::*;
