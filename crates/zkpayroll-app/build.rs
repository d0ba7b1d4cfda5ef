use std::fs;
use std::path::PathBuf;

// Embeds the workspace VERSION file as ZKPAYROLL_VERSION.
fn main() {
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("manifest dir"));
    let workspace_root = manifest_dir
        .ancestors()
        .nth(2)
        .expect("crate lives two levels below the workspace root");
    let version_path = workspace_root.join("VERSION");
    println!("cargo:rerun-if-changed={}", version_path.display());

    let version = fs::read_to_string(&version_path)
        .unwrap_or_else(|error| panic!("read {}: {error}", version_path.display()));
    let version = version.trim();
    assert!(!version.is_empty(), "VERSION must not be empty");
    assert!(
        version.split('.').count() == 3,
        "VERSION must be MAJOR.MINOR.PATCH, got {version}"
    );

    println!("cargo:rustc-env=ZKPAYROLL_VERSION={version}");
}
