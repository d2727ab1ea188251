//! Writes `build_info.rs` with the commit and build date shown by
//! `flappy --version`.

use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::Command;

/// Non-empty value of a release override such as `BUILD_COMMIT`.
fn env_override(name: &str) -> Option<String> {
    println!("cargo:rerun-if-env-changed={}", name);
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Trimmed stdout of a git command that succeeded.
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|out| out.trim().to_string())
}

/// Short hash of HEAD, suffixed with `-dirty` when tracked files changed.
fn git_commit() -> String {
    if let Some(commit) = env_override("BUILD_COMMIT") {
        return commit;
    }
    let Some(commit) = git(&["rev-parse", "--short=7", "HEAD"]).filter(|c| !c.is_empty()) else {
        return "unknown".to_string();
    };
    let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
        .map_or(false, |status| !status.is_empty());
    if dirty {
        format!("{}-dirty", commit)
    } else {
        commit
    }
}

fn build_date() -> String {
    env_override("BUILD_DATE")
        .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string())
}

fn main() -> io::Result<()> {
    let out_dir = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "OUT_DIR is not set"))?;

    let source = format!(
        "pub const BUILD_COMMIT: &str = {:?};\npub const BUILD_DATE: &str = {:?};\n",
        git_commit(),
        build_date()
    );
    fs::write(out_dir.join("build_info.rs"), source)?;

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
    Ok(())
}
