// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=TINY_MIRROR_VERSION");

    // Packagers (flatpak, distro builds) pin the version explicitly
    let version = std::env::var("TINY_MIRROR_VERSION").unwrap_or_else(|_| describe_version());

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// Version from `git describe`, e.g. "0.1.0-3f2a9c1" or "0.1.0-dirty-3f2a9c1"
fn describe_version() -> String {
    let described = git(&["describe", "--tags", "--always", "--match", "v*"]);
    let commit = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".to_string());

    let Some(described) = described else {
        return format!("{}-{}", env!("CARGO_PKG_VERSION"), commit);
    };
    let described = described.strip_prefix('v').unwrap_or(&described);

    // "<tag>-<commits>-g<hash>" means HEAD is past the tag
    let parts: Vec<&str> = described.rsplitn(3, '-').collect();
    match parts.as_slice() {
        [hash, _commits, base] => {
            let hash = hash.strip_prefix('g').unwrap_or(hash);
            format!("{}-dirty-{}", base, hash)
        }
        _ if described == commit => format!("{}-{}", env!("CARGO_PKG_VERSION"), commit),
        _ => format!("{}-{}", described, commit),
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}
