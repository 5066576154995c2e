//! Working tree access
//!
//! Lists, reads and writes the user's files. Paths handed in and out are
//! relative to the working tree root; the repository directory is never listed.

use crate::areas::repository::REPO_DIR;
use crate::artifacts::checkout::migration::{ActionType, Migration};
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::ignore::IgnoreFilter;
use crate::artifacts::index::entry_mode::FileMode;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object::Object;
use anyhow::Context;
use bytes::Bytes;
use is_executable::IsExecutable;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every non-ignored file in the working tree, in path order
    pub fn list_files(&self, ignore: &dyn IgnoreFilter) -> anyhow::Result<Vec<PathBuf>> {
        self.walk_files(&self.path, ignore)
    }

    /// Non-ignored files at or under `path`
    ///
    /// A missing path is an error; an ignored path yields nothing.
    pub fn list_files_under(
        &self,
        path: &Path,
        ignore: &dyn IgnoreFilter,
    ) -> anyhow::Result<Vec<PathBuf>> {
        let absolute_path = self.path.join(path);
        if !absolute_path.exists() {
            anyhow::bail!("pathspec '{}' did not match any files", path.display());
        }

        if absolute_path.is_dir() {
            self.walk_files(&absolute_path, ignore)
        } else {
            let relative = self.relative(&absolute_path)?;
            if Self::is_repo_path(&relative) || ignore.is_ignored(&relative) {
                Ok(Vec::new())
            } else {
                Ok(vec![relative])
            }
        }
    }

    fn walk_files(&self, root: &Path, ignore: &dyn IgnoreFilter) -> anyhow::Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                self.relative(entry.path())
                    .map(|relative| !Self::is_repo_path(&relative))
                    .unwrap_or(true)
            });

        for entry in walker {
            let entry = entry.with_context(|| format!("Unable to list {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = self.relative(entry.path())?;
            if !ignore.is_ignored(&relative) {
                files.push(relative);
            }
        }

        Ok(files)
    }

    fn relative(&self, path: &Path) -> anyhow::Result<PathBuf> {
        path.strip_prefix(&self.path)
            .map(Path::to_path_buf)
            .with_context(|| format!("{} is outside the working tree", path.display()))
    }

    fn is_repo_path(relative: &Path) -> bool {
        relative.components().next().is_some_and(|first| first.as_os_str() == REPO_DIR)
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.path.join(path).exists()
    }

    pub fn is_file(&self, path: &Path) -> bool {
        self.path.join(path).is_file()
    }

    pub fn is_dir(&self, path: &Path) -> bool {
        self.path.join(path).is_dir()
    }

    pub fn read_file(&self, path: &Path) -> anyhow::Result<Bytes> {
        let data = std::fs::read(self.path.join(path))
            .with_context(|| format!("Unable to read file {}", path.display()))?;

        Ok(Bytes::from(data))
    }

    pub fn file_mode(&self, path: &Path) -> FileMode {
        if self.path.join(path).is_executable() {
            FileMode::Executable
        } else {
            FileMode::Regular
        }
    }

    /// The tree entry the file would get if it were stored now
    pub fn hash_file(&self, path: &Path) -> anyhow::Result<DatabaseEntry> {
        let blob = Blob::new(self.read_file(path)?);
        Ok(DatabaseEntry::file(blob.object_id()?, self.file_mode(path)))
    }

    /// Write `data` at `path`, replacing a directory in the way and creating parents
    pub fn write_file(&self, path: &Path, data: &[u8], mode: FileMode) -> anyhow::Result<()> {
        let absolute_path = self.path.join(path);

        if absolute_path.is_dir() {
            std::fs::remove_dir_all(&absolute_path)
                .with_context(|| format!("Unable to remove directory {}", path.display()))?;
        }
        if let Some(parent) = absolute_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Unable to create directory {}", parent.display()))?;
        }

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&absolute_path)
            .with_context(|| format!("Unable to open file {}", path.display()))?;
        file.write_all(data)
            .with_context(|| format!("Unable to write file {}", path.display()))?;

        Self::set_mode(&absolute_path, mode)
    }

    #[cfg(unix)]
    fn set_mode(absolute_path: &Path, mode: FileMode) -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let bits = match mode {
            FileMode::Regular => 0o644,
            FileMode::Executable => 0o755,
        };
        std::fs::set_permissions(absolute_path, std::fs::Permissions::from_mode(bits))
            .with_context(|| format!("Unable to set permissions on {}", absolute_path.display()))
    }

    #[cfg(not(unix))]
    fn set_mode(_absolute_path: &Path, _mode: FileMode) -> anyhow::Result<()> {
        Ok(())
    }

    /// Remove a file (or directory) and any parent directories left empty
    pub fn remove_file(&self, path: &Path) -> anyhow::Result<()> {
        let absolute_path = self.path.join(path);

        if absolute_path.is_dir() {
            std::fs::remove_dir_all(&absolute_path)
                .with_context(|| format!("Unable to remove directory {}", path.display()))?;
        } else if absolute_path.exists() {
            std::fs::remove_file(&absolute_path)
                .with_context(|| format!("Unable to remove file {}", path.display()))?;
        }

        for parent in path.ancestors().skip(1) {
            if parent.as_os_str().is_empty() || !self.remove_empty_directory(parent)? {
                break;
            }
        }

        Ok(())
    }

    /// Returns whether the directory was removed
    fn remove_empty_directory(&self, path: &Path) -> anyhow::Result<bool> {
        let absolute_path = self.path.join(path);
        if !absolute_path.is_dir() {
            return Ok(false);
        }

        let is_empty = std::fs::read_dir(&absolute_path)?.next().is_none();
        if is_empty {
            std::fs::remove_dir(&absolute_path)
                .with_context(|| format!("Unable to remove directory {}", path.display()))?;
        }

        Ok(is_empty)
    }

    fn make_directory(&self, path: &Path) -> anyhow::Result<()> {
        let absolute_path = self.path.join(path);

        if absolute_path.is_file() {
            std::fs::remove_file(&absolute_path)
                .with_context(|| format!("Unable to remove file {}", path.display()))?;
        }
        if !absolute_path.exists() {
            std::fs::create_dir(&absolute_path)
                .with_context(|| format!("Unable to create directory {}", path.display()))?;
        }

        Ok(())
    }

    // Deletions first, then emptied directories deepest first, then new
    // directories outermost first, then file writes.
    pub fn apply_migration(&self, migration: &Migration) -> anyhow::Result<()> {
        for (path, _) in migration.actions_of(ActionType::Delete) {
            let absolute_path = self.path.join(path);
            if absolute_path.is_file() {
                std::fs::remove_file(&absolute_path)
                    .with_context(|| format!("Unable to remove file {}", path.display()))?;
            }
        }

        for dir in migration.rmdirs().iter().rev() {
            self.remove_empty_directory(dir)?;
        }

        for dir in migration.mkdirs() {
            self.make_directory(dir)?;
        }

        for action in [ActionType::Modify, ActionType::Add] {
            for (path, entry) in migration.actions_of(action) {
                let entry = entry
                    .as_ref()
                    .with_context(|| format!("No entry to write at {}", path.display()))?;
                let mode = FileMode::try_from(entry.mode)?;
                let data = migration.load_blob_data(&entry.oid)?;

                self.write_file(path, &data, mode)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::ignore::NoIgnore;
    use crate::artifacts::ignore::patterns::IgnorePatterns;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        dir.child("a.txt").write_str("a").unwrap();
        dir.child("src/main.rs").write_str("fn main() {}").unwrap();
        dir.child("target/debug/app").write_str("binary").unwrap();
        dir.child(".repo/HEAD").write_str("ref: refs/heads/main\n").unwrap();
        dir
    }

    #[rstest]
    fn lists_files_but_not_the_repository_directory(tree: TempDir) {
        let workspace = Workspace::new(tree.path().to_path_buf().into_boxed_path());

        assert_eq!(
            workspace.list_files(&NoIgnore).unwrap(),
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("src/main.rs"),
                PathBuf::from("target/debug/app"),
            ]
        );
    }

    #[rstest]
    fn ignored_directories_are_skipped(tree: TempDir) {
        let workspace = Workspace::new(tree.path().to_path_buf().into_boxed_path());
        let ignore = IgnorePatterns::try_parse("target\n").unwrap();

        assert_eq!(
            workspace.list_files(&ignore).unwrap(),
            vec![PathBuf::from("a.txt"), PathBuf::from("src/main.rs")]
        );
    }

    #[rstest]
    fn missing_paths_do_not_match(tree: TempDir) {
        let workspace = Workspace::new(tree.path().to_path_buf().into_boxed_path());

        assert!(workspace.list_files_under(Path::new("nope"), &NoIgnore).is_err());
    }

    #[rstest]
    fn removing_the_last_file_removes_empty_parents(tree: TempDir) {
        let workspace = Workspace::new(tree.path().to_path_buf().into_boxed_path());

        workspace.remove_file(Path::new("target/debug/app")).unwrap();

        assert!(!tree.child("target").exists());
        assert!(tree.child("a.txt").exists());
    }

    #[cfg(unix)]
    #[rstest]
    fn executable_mode_is_written_and_detected(tree: TempDir) {
        let workspace = Workspace::new(tree.path().to_path_buf().into_boxed_path());

        workspace
            .write_file(Path::new("bin/run.sh"), b"#!/bin/sh\n", FileMode::Executable)
            .unwrap();

        assert_eq!(workspace.file_mode(Path::new("bin/run.sh")), FileMode::Executable);
        assert_eq!(workspace.file_mode(Path::new("a.txt")), FileMode::Regular);
    }
}
