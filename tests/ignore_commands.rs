use assert_fs::TempDir;
use common::command::{init_repository_dir, porcelain_status, run_svcs_command};
use common::file::{FileSpec, read_file, write_file};
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;

#[rstest]
fn add_ignore_appends_only_new_patterns(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();

    run_svcs_command(dir, &["add-ignore", "*.log", "build/"])
        .assert()
        .success()
        .stdout("Ignoring '*.log'\nIgnoring 'build/'\n");
    run_svcs_command(dir, &["add-ignore", "*.log", "/tmp"])
        .assert()
        .success()
        .stdout("Ignoring '/tmp'\n");

    assert_eq!(read_file(&dir.join(".ignore")), "*.log\nbuild/\n/tmp\n");
}

#[rstest]
fn ls_files_skips_ignored_files(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    write_file(FileSpec::new(dir.join("debug.log"), "log".to_string()));
    write_file(FileSpec::new(dir.join("a/trace.log"), "log".to_string()));
    write_file(FileSpec::new(dir.join("build/out.bin"), "bin".to_string()));
    write_file(FileSpec::new(dir.join("a/tmp/kept.txt"), "kept".to_string()));
    write_file(FileSpec::new(dir.join("tmp/dropped.txt"), "dropped".to_string()));
    run_svcs_command(dir, &["add-ignore", "*.log", "build/", "/tmp"])
        .assert()
        .success();

    run_svcs_command(dir, &["ls-files"])
        .assert()
        .success()
        .stdout(".ignore\n1.txt\na/2.txt\na/b/3.txt\na/tmp/kept.txt\n");
}

#[rstest]
fn ignored_files_are_neither_untracked_nor_staged(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    write_file(FileSpec::new(dir.join("debug.log"), "log".to_string()));
    write_file(FileSpec::new(dir.join("notes.txt"), "notes".to_string()));
    run_svcs_command(dir, &["add-ignore", "*.log"])
        .assert()
        .success();

    assert_eq!(porcelain_status(dir), vec!["?? .ignore", "?? notes.txt"]);

    run_svcs_command(dir, &["add", "."]).assert().success();
    assert_eq!(porcelain_status(dir), vec!["A  .ignore", "A  notes.txt"]);
}
