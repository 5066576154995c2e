use assert_fs::TempDir;
use common::command::{
    init_repository_dir, porcelain_status, repository_dir, run_svcs_command, svcs_commit,
};
use common::file::{FileSpec, delete_path, write_file, write_generated_files};
use predicates::prelude::predicate;
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;

#[rstest]
fn add_stages_files_from_nested_directories(repository_dir: TempDir) {
    let dir = repository_dir.path();
    run_svcs_command(dir, &["init"]).assert().success();
    write_file(FileSpec::new(dir.join("top.txt"), "top".to_string()));
    write_file(FileSpec::new(dir.join("x/y/z.txt"), "deep".to_string()));

    run_svcs_command(dir, &["add", "x"]).assert().success();

    assert_eq!(
        porcelain_status(dir),
        vec!["A  x/y/z.txt".to_string(), "?? top.txt".to_string()]
    );
}

#[rstest]
fn add_stages_many_generated_files(repository_dir: TempDir) {
    let dir = repository_dir.path();
    run_svcs_command(dir, &["init"]).assert().success();
    let files = write_generated_files(dir, 8);

    run_svcs_command(dir, &["add", "."]).assert().success();

    let status = porcelain_status(dir);
    assert_eq!(status.len(), files.len());
    assert!(status.iter().all(|line| line.starts_with("A  ")));
}

#[rstest]
fn adding_a_missing_path_fails(repository_dir: TempDir) {
    let dir = repository_dir.path();
    run_svcs_command(dir, &["init"]).assert().success();

    run_svcs_command(dir, &["add", "nope.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("did not match any files"));
}

#[rstest]
fn adding_a_deleted_tracked_file_stages_its_removal(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    delete_path(&dir.join("a").join("b"));

    run_svcs_command(dir, &["add", "a"]).assert().success();

    assert_eq!(porcelain_status(dir), vec!["D  a/b/3.txt".to_string()]);

    svcs_commit(dir, "Remove b").assert().success();
    assert!(porcelain_status(dir).is_empty());
}

#[rstest]
fn re_adding_an_unchanged_file_stages_nothing(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();

    run_svcs_command(dir, &["add", "1.txt"]).assert().success();

    svcs_commit(dir, "Nothing")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to commit"));
}

#[rstest]
fn reverting_a_staged_edit_unstages_it(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    write_file(FileSpec::new(dir.join("1.txt"), "edited".to_string()));
    run_svcs_command(dir, &["add", "1.txt"]).assert().success();
    assert_eq!(porcelain_status(dir), vec!["M  1.txt".to_string()]);

    write_file(FileSpec::new(dir.join("1.txt"), "one".to_string()));
    run_svcs_command(dir, &["add", "1.txt"]).assert().success();

    assert!(porcelain_status(dir).is_empty());
}

#[rstest]
fn ignored_files_are_not_staged(repository_dir: TempDir) {
    let dir = repository_dir.path();
    run_svcs_command(dir, &["init"]).assert().success();
    write_file(FileSpec::new(dir.join(".ignore"), "*.log\nbuild\n".to_string()));
    write_file(FileSpec::new(dir.join("app.rs"), "fn main() {}".to_string()));
    write_file(FileSpec::new(dir.join("debug.log"), "noise".to_string()));
    write_file(FileSpec::new(dir.join("build/out.bin"), "binary".to_string()));

    run_svcs_command(dir, &["add", "."]).assert().success();

    assert_eq!(
        porcelain_status(dir),
        vec!["A  .ignore".to_string(), "A  app.rs".to_string()]
    );
}
