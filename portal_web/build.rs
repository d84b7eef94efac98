use std::env;
use std::process::Command;

/// `PORTAL_BUILD_ID` takes precedence over the git hash.
fn main() {
    println!("cargo:rerun-if-env-changed=PORTAL_BUILD_ID");
    println!("cargo:rerun-if-changed=../.git/HEAD");

    let build_id = env::var("PORTAL_BUILD_ID")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(git_short_hash)
        .unwrap_or_else(|| "dev".to_string());

    println!("cargo:rustc-env=PORTAL_BUILD_ID={build_id}");
}

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!hash.is_empty()).then_some(hash)
}
