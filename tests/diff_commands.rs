use assert_fs::TempDir;
use common::command::{commit_all, init_repository_dir, run_svcs_command};
use common::file::{FileSpec, delete_path, write_file};
use predicates::prelude::predicate;
use rstest::rstest;

mod common;

#[rstest]
fn diff_lists_added_removed_and_modified_files(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    write_file(FileSpec::new(dir.join("1.txt"), "uno".to_string()));
    write_file(FileSpec::new(dir.join("a-new.txt"), "new".to_string()));
    delete_path(&dir.join("a").join("b").join("3.txt"));
    commit_all(dir, "Change things");

    run_svcs_command(dir, &["diff", "HEAD^", "HEAD"])
        .assert()
        .success()
        .stdout("M\t1.txt\nA\ta-new.txt\nD\ta/b/3.txt\n");

    run_svcs_command(dir, &["diff", "HEAD", "HEAD^"])
        .assert()
        .success()
        .stdout("M\t1.txt\nD\ta-new.txt\nA\ta/b/3.txt\n");
}

#[rstest]
fn diff_filter_limits_the_kinds(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    write_file(FileSpec::new(dir.join("1.txt"), "uno".to_string()));
    write_file(FileSpec::new(dir.join("z.txt"), "zed".to_string()));
    commit_all(dir, "Change things");

    run_svcs_command(dir, &["diff", "HEAD~1", "HEAD", "--diff-filter", "A"])
        .assert()
        .success()
        .stdout("A\tz.txt\n");
}

#[rstest]
fn file_replaced_by_a_directory(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    delete_path(&dir.join("1.txt"));
    write_file(FileSpec::new(dir.join("1.txt").join("inner.txt"), "inner".to_string()));
    commit_all(dir, "File to directory");

    run_svcs_command(dir, &["diff", "HEAD^", "HEAD"])
        .assert()
        .success()
        .stdout("D\t1.txt\nA\t1.txt/inner.txt\n");
}

#[rstest]
fn same_revision_has_no_changes(init_repository_dir: TempDir) {
    run_svcs_command(init_repository_dir.path(), &["diff", "main", "HEAD"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
