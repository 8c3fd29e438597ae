use assert_cmd::Command;
use std::path::Path;

/// Fixed commit date so command output and IDs are reproducible
pub const COMMIT_DATE: &str = "2024-03-01 12:30:00 +0200";

pub fn run_gitlet_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("gitlet").expect("Failed to find gitlet binary");
    cmd.current_dir(dir)
        .env("GITLET_COMMIT_DATE", COMMIT_DATE)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .args(args);
    cmd
}

pub fn gitlet_commit(dir: &Path, message: &str) -> Command {
    run_gitlet_command(dir, &["commit", "-m", message])
}
