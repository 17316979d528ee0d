use std::process::ExitCode;

fn main() -> ExitCode {
    cl_wrangler::cli::run_installer()
}
