//! Build metadata for headunit-services
//!
//! Exports `BUILD_DATE`, `BUILD_TIME` and `GIT_HASH` for the startup banner.

use std::process::Command;

/// Trimmed stdout of a successful command with non-empty output
fn stdout_of(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn stamp(key: &str, value: Option<String>) {
    let value = value.unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env={key}={value}");
}

fn main() {
    stamp("BUILD_DATE", stdout_of("date", &["+%Y-%m-%d"]));
    stamp("BUILD_TIME", stdout_of("date", &["+%H:%M:%S"]));
    stamp("GIT_HASH", stdout_of("git", &["rev-parse", "--short", "HEAD"]));

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=build.rs");
}
