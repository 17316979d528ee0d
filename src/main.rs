fn main() {
    let code = cl_wrangler::cli::run_launcher(std::env::args_os().skip(1));
    std::process::exit(code);
}
