use log::LevelFilter;
use std::io::Write;

/// Variable holding `env_logger` filter directives, e.g. `CL_WRANGLER_LOG=debug`
pub const LOG_ENV: &str = "CL_WRANGLER_LOG";

/// Initialise stderr logging with a `[cl-wrangler]` prefix.
///
/// Safe to call more than once; only the first call installs the logger.
pub fn init_logger(default_level: LevelFilter) {
    let env = env_logger::Env::new().filter(LOG_ENV);
    let _ = env_logger::Builder::new()
        .filter_level(default_level)
        .parse_env(env)
        .format(|buf, record| {
            if record.level() <= log::Level::Warn {
                writeln!(buf, "[cl-wrangler] {}: {}", record.level(), record.args())
            } else {
                writeln!(buf, "[cl-wrangler] {}", record.args())
            }
        })
        .target(env_logger::Target::Stderr)
        .try_init();
}
