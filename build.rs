use std::env;

fn main() {
    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=BUILD_PROFILE={}", profile);
    println!("cargo:rustc-env=BUILD_TARGET={}", target);

    // Git info, if this is a checkout
    let git_hash = std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string());

    match git_hash {
        Some(hash) => {
            println!("cargo:rustc-env=GIT_HASH={}", hash);
            let clean = std::process::Command::new("git")
                .args(["status", "--porcelain"])
                .output()
                .map(|status| status.stdout.is_empty())
                .unwrap_or(false);
            println!("cargo:rustc-env=GIT_CLEAN={}", clean);
        }
        None => {
            println!("cargo:rustc-env=GIT_HASH=unknown");
            println!("cargo:rustc-env=GIT_CLEAN=unknown");
        }
    }

    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    println!("cargo:rustc-env=BUILD_DATE={}", now);
    println!("cargo:rerun-if-changed=build.rs");
}
