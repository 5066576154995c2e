use assert_fs::TempDir;
use common::command::{init_repository_dir, porcelain_status, repository_dir, run_svcs_command};
use common::file::{FileSpec, delete_path, write_file};
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;

#[rstest]
fn print_nothing_when_no_files_are_changed(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();

    assert!(porcelain_status(dir).is_empty());
    run_svcs_command(dir, &["status"])
        .assert()
        .success()
        .stdout("On branch main\n\nnothing to commit, working tree clean\n");
}

#[rstest]
fn list_untracked_files_in_name_order(repository_dir: TempDir) {
    let dir = repository_dir.path();
    run_svcs_command(dir, &["init"]).assert().success();
    write_file(FileSpec::new(dir.join("file.txt"), "".to_string()));
    write_file(FileSpec::new(dir.join("another.txt"), "".to_string()));
    write_file(FileSpec::new(dir.join("dir/nested.txt"), "".to_string()));

    assert_eq!(
        porcelain_status(dir),
        vec!["?? another.txt", "?? dir/nested.txt", "?? file.txt"]
    );
}

#[rstest]
fn report_files_with_modified_contents(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    write_file(FileSpec::new(dir.join("1.txt"), "changed".to_string()));
    write_file(FileSpec::new(dir.join("a/2.txt"), "modified".to_string()));

    assert_eq!(porcelain_status(dir), vec![" M 1.txt", " M a/2.txt"]);
}

#[rstest]
fn report_modified_files_with_unchanged_size(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    write_file(FileSpec::new(dir.join("a/b/3.txt"), "hello".to_string()));

    assert_eq!(porcelain_status(dir), vec![" M a/b/3.txt"]);
}

#[rstest]
fn report_files_in_deleted_directories(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    delete_path(&dir.join("a"));

    assert_eq!(porcelain_status(dir), vec![" D a/2.txt", " D a/b/3.txt"]);
}

#[cfg(unix)]
#[rstest]
fn report_modified_modes(init_repository_dir: TempDir) {
    use std::os::unix::fs::PermissionsExt;

    let dir = init_repository_dir.path();
    std::fs::set_permissions(dir.join("a/2.txt"), std::fs::Permissions::from_mode(0o755))
        .unwrap();

    assert_eq!(porcelain_status(dir), vec![" M a/2.txt"]);
}

#[rstest]
fn report_staged_and_unstaged_halves_separately(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    write_file(FileSpec::new(dir.join("1.txt"), "staged".to_string()));
    run_svcs_command(dir, &["add", "1.txt"]).assert().success();
    write_file(FileSpec::new(dir.join("1.txt"), "then edited".to_string()));
    write_file(FileSpec::new(dir.join("new.txt"), "new".to_string()));
    run_svcs_command(dir, &["add", "new.txt"]).assert().success();
    delete_path(&dir.join("new.txt"));

    assert_eq!(porcelain_status(dir), vec!["MM 1.txt", "AD new.txt"]);
}

#[rstest]
fn long_format_groups_the_changes(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    write_file(FileSpec::new(dir.join("1.txt"), "staged".to_string()));
    run_svcs_command(dir, &["add", "1.txt"]).assert().success();
    delete_path(&dir.join("a/2.txt"));
    write_file(FileSpec::new(dir.join("stray.txt"), "stray".to_string()));

    run_svcs_command(dir, &["status"])
        .assert()
        .success()
        .stdout(
            "On branch main\n\n\
             Changes to be committed:\n        modified:   1.txt\n\n\
             Changes not staged for commit:\n        deleted:    a/2.txt\n\n\
             Untracked files:\n\tstray.txt\n\n",
        );
}
