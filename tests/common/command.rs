use crate::common::file::{FileSpec, write_file};
use assert_cmd::Command;
use assert_fs::TempDir;
use rstest::fixture;
use std::path::Path;

pub const REPO_DIR: &str = ".repo";

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// A repository with one commit holding `1.txt`, `a/2.txt` and `a/b/3.txt`
#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_svcs_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "one".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("2.txt"),
        "two".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("b").join("3.txt"),
        "three".to_string(),
    ));

    run_svcs_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();

    svcs_commit(repository_dir.path(), "Initial commit")
        .assert()
        .success();

    repository_dir
}

pub fn run_svcs_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("svcs").expect("Failed to find svcs binary");
    cmd.env_remove("RUST_LOG");
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn with_author(mut cmd: Command) -> Command {
    cmd.envs(vec![
        ("SVCS_AUTHOR_NAME", "fake_user"),
        ("SVCS_AUTHOR_EMAIL", "fake_email@email.com"),
        ("SVCS_AUTHOR_DATE", "2023-01-01 12:00:00 +0000"), // %Y-%m-%d %H:%M:%S %z
    ]);
    cmd
}

pub fn svcs_commit(dir: &Path, message: &str) -> Command {
    with_author(run_svcs_command(dir, &["commit", "-m", message]))
}

pub fn svcs_merge(dir: &Path, source: &str) -> Command {
    with_author(run_svcs_command(dir, &["merge", source]))
}

/// Stage everything and commit it
pub fn commit_all(dir: &Path, message: &str) {
    run_svcs_command(dir, &["add", "."]).assert().success();
    svcs_commit(dir, message).assert().success();
}

/// The commit HEAD points to, directly or through its branch
pub fn get_head_commit_sha(dir: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let head_content = std::fs::read_to_string(dir.join(REPO_DIR).join("HEAD"))?;

    if let Some(ref_path) = head_content.trim().strip_prefix("ref: ") {
        let commit_sha = std::fs::read_to_string(dir.join(REPO_DIR).join(ref_path))?;
        Ok(commit_sha.trim().to_string())
    } else {
        Ok(head_content.trim().to_string())
    }
}

pub fn get_branch_sha(dir: &Path, name: &str) -> Result<String, Box<dyn std::error::Error>> {
    let path = dir.join(REPO_DIR).join("refs").join("heads").join(name);
    Ok(std::fs::read_to_string(path)?.trim().to_string())
}

/// Parent ids of a commit, read through `cat-file`
pub fn get_parent_commit_ids(
    dir: &Path,
    commit_id: &str,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let output = run_svcs_command(dir, &["cat-file", commit_id]).output()?;
    let stdout = String::from_utf8(output.stdout)?;

    Ok(stdout
        .lines()
        .filter_map(|line| line.strip_prefix("parent "))
        .map(str::to_string)
        .collect())
}

/// Output lines of `status --porcelain`
pub fn porcelain_status(dir: &Path) -> Vec<String> {
    let output = run_svcs_command(dir, &["status", "--porcelain"])
        .output()
        .expect("Failed to run status");
    assert!(output.status.success(), "status failed: {:?}", output);

    String::from_utf8(output.stdout)
        .expect("status output is not UTF-8")
        .lines()
        .map(str::to_string)
        .collect()
}
