use assert_fs::TempDir;
use common::command::{
    REPO_DIR, commit_all, get_branch_sha, get_head_commit_sha, init_repository_dir,
    repository_dir, run_svcs_command,
};
use common::file::{FileSpec, write_file};
use predicates::prelude::predicate;
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;

#[rstest]
#[case("feature")]
#[case("feature/login")]
#[case("release-1.0")]
#[case("fix_42")]
fn create_branch_with_valid_name(init_repository_dir: TempDir, #[case] name: &str) {
    let dir = init_repository_dir.path();

    run_svcs_command(dir, &["branch", "create", name])
        .assert()
        .success();

    assert_eq!(
        get_branch_sha(dir, name).unwrap(),
        get_head_commit_sha(dir).unwrap()
    );
}

#[rstest]
#[case("bad..name")]
#[case(".hidden")]
#[case("ends.lock")]
#[case("with space")]
#[case("trailing/")]
fn create_branch_with_invalid_name(init_repository_dir: TempDir, #[case] name: &str) {
    run_svcs_command(init_repository_dir.path(), &["branch", "create", name])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid branch name"));
}

#[rstest]
fn create_duplicate_branch_fails(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    run_svcs_command(dir, &["branch", "create", "topic"])
        .assert()
        .success();

    run_svcs_command(dir, &["branch", "create", "topic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[rstest]
fn create_branch_from_a_parent_revision(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    let first = get_head_commit_sha(dir).unwrap();
    write_file(FileSpec::new(dir.join("1.txt"), "changed".to_string()));
    commit_all(dir, "Second");

    run_svcs_command(dir, &["branch", "create", "old", "HEAD^"])
        .assert()
        .success();
    run_svcs_command(dir, &["branch", "create", "older", "main~1"])
        .assert()
        .success();
    run_svcs_command(dir, &["branch", "create", "abbrev", &first[..7]])
        .assert()
        .success();

    assert_eq!(get_branch_sha(dir, "old").unwrap(), first);
    assert_eq!(get_branch_sha(dir, "older").unwrap(), first);
    assert_eq!(get_branch_sha(dir, "abbrev").unwrap(), first);
}

#[rstest]
fn create_branch_from_an_unknown_revision_fails(init_repository_dir: TempDir) {
    run_svcs_command(init_repository_dir.path(), &["branch", "create", "x", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown revision 'nowhere'"));
}

#[rstest]
fn create_branch_without_commits_fails(repository_dir: TempDir) {
    let dir = repository_dir.path();
    run_svcs_command(dir, &["init"]).assert().success();

    run_svcs_command(dir, &["branch", "create", "topic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown revision 'HEAD'"));
}

#[rstest]
fn list_branches_marks_the_current_one(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    for name in ["zeta", "alpha", "team/beta"] {
        run_svcs_command(dir, &["branch", "create", name])
            .assert()
            .success();
    }

    run_svcs_command(dir, &["branch", "list"])
        .assert()
        .success()
        .stdout("  alpha\n* main\n  team/beta\n  zeta\n");
}

#[rstest]
fn delete_branch(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    run_svcs_command(dir, &["branch", "create", "team/topic"])
        .assert()
        .success();

    run_svcs_command(dir, &["branch", "delete", "team/topic"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Deleted branch team/topic (was "));

    assert!(!dir.join(REPO_DIR).join("refs/heads/team").exists());
}

#[rstest]
fn deleting_the_current_branch_fails(init_repository_dir: TempDir) {
    run_svcs_command(init_repository_dir.path(), &["branch", "delete", "main"])
        .assert()
        .failure();
}

#[rstest]
fn deleting_a_missing_branch_fails(init_repository_dir: TempDir) {
    run_svcs_command(init_repository_dir.path(), &["branch", "delete", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown revision 'ghost'"));
}
