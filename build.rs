use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let hash = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_default();
    let dirty = git(&["status", "--porcelain"]).is_some_and(|s| !s.is_empty());

    // "0.1.0", "0.1.0 (a1b2c3d)" or "0.1.0 (a1b2c3d-dirty)"
    let pkg_version = env!("CARGO_PKG_VERSION");
    let version = match (hash.is_empty(), dirty) {
        (true, _) => pkg_version.to_string(),
        (false, false) => format!("{} ({})", pkg_version, hash),
        (false, true) => format!("{} ({}-dirty)", pkg_version, hash),
    };

    println!("cargo:rustc-env=COUPON_LEDGER_VERSION={}", version);
}
