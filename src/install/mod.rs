pub mod executable;
pub mod lock;
pub mod locator;
pub mod optimize;
pub mod orchestrator;

pub use orchestrator::{Installer, report_failure};
