use assert_fs::TempDir;
use common::command::{
    REPO_DIR, get_head_commit_sha, get_parent_commit_ids, init_repository_dir, repository_dir,
    run_svcs_command, svcs_commit,
};
use common::file::{FileSpec, write_file};
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;

#[rstest]
fn first_commit_is_a_root_commit(repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir.path();
    run_svcs_command(dir, &["init"]).assert().success();
    write_file(FileSpec::new(dir.join("hello.txt"), "hello".to_string()));
    run_svcs_command(dir, &["add", "hello.txt"]).assert().success();

    svcs_commit(dir, "First commit\n\nWith a body")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^\[main \(root-commit\) [0-9a-f]{7}\] First commit\n$")?);

    let head = get_head_commit_sha(dir)?;
    assert_eq!(head.len(), 64);
    assert!(get_parent_commit_ids(dir, &head)?.is_empty());

    Ok(())
}

#[rstest]
fn commit_records_the_previous_head_as_parent(
    init_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir.path();
    let first = get_head_commit_sha(dir)?;

    write_file(FileSpec::new(dir.join("1.txt"), "uno".to_string()));
    run_svcs_command(dir, &["add", "1.txt"]).assert().success();
    svcs_commit(dir, "Second commit")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^\[main [0-9a-f]{7}\] Second commit\n$")?);

    let second = get_head_commit_sha(dir)?;
    assert_eq!(get_parent_commit_ids(dir, &second)?, vec![first]);

    Ok(())
}

#[rstest]
fn commit_clears_the_index(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();

    svcs_commit(dir, "Again")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to commit"));
}

#[rstest]
fn commit_without_author_fails(repository_dir: TempDir) {
    let dir = repository_dir.path();
    run_svcs_command(dir, &["init"]).assert().success();
    write_file(FileSpec::new(dir.join("a.txt"), "a".to_string()));
    run_svcs_command(dir, &["add", "a.txt"]).assert().success();

    run_svcs_command(dir, &["commit", "-m", "anonymous"])
        .env_remove("SVCS_AUTHOR_NAME")
        .assert()
        .failure()
        .stderr(predicate::str::contains("SVCS_AUTHOR_NAME not set"));
}

#[rstest]
fn identical_trees_share_one_object(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir.path();
    let objects_before = count_objects(dir);

    write_file(FileSpec::new(dir.join("copy.txt"), "one".to_string()));
    run_svcs_command(dir, &["add", "copy.txt"]).assert().success();
    svcs_commit(dir, "Copy").assert().success();

    // new root tree and commit, the blob is shared with 1.txt
    assert_eq!(count_objects(dir), objects_before + 2);

    Ok(())
}

#[rstest]
fn cat_file_prints_blobs_and_trees(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir.path();
    let head = get_head_commit_sha(dir)?;

    let commit = run_svcs_command(dir, &["cat-file", &head[..8]])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let commit = String::from_utf8(commit)?;
    assert!(commit.contains("author fake_user <fake_email@email.com> 1672574400 +0000"));
    let tree = commit
        .lines()
        .find_map(|line| line.strip_prefix("tree "))
        .ok_or("commit without tree")?
        .to_string();

    run_svcs_command(dir, &["cat-file", &tree])
        .assert()
        .success()
        .stdout(predicate::str::contains("blob").and(predicate::str::contains("\t1.txt")))
        .stdout(predicate::str::contains("tree").and(predicate::str::contains("\ta")));

    run_svcs_command(dir, &["cat-file", "HEAD"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initial commit"));

    run_svcs_command(dir, &["cat-file", "deadbeef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a valid object name"));

    Ok(())
}

fn count_objects(dir: &std::path::Path) -> usize {
    walkdir::WalkDir::new(dir.join(REPO_DIR).join("objects"))
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .count()
}
