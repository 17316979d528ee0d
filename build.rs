fn main() {
    // Release tag to download when neither CL_VERSION nor package.json says otherwise
    let version = std::env::var("VERSION")
        .or_else(|_| std::env::var("CARGO_PKG_VERSION"))
        .unwrap_or_default();
    println!("cargo:rustc-env=CL_WRANGLER_RELEASE_VERSION={}", version);
    println!("cargo:rerun-if-env-changed=VERSION");
}
