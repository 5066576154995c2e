use crate::areas::repository::Repository;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

impl Repository {
    /// Stage files and directories as they are in the working tree
    ///
    /// Ignored files are skipped, tracked files that no longer exist are staged
    /// as deletions, and files matching HEAD drop out of the index.
    pub async fn add(&self, paths: &[String]) -> anyhow::Result<()> {
        let ignore = self.ignore_patterns()?;
        let head_files = self.flatten_tree(self.head_tree()?.as_ref())?;

        let index = self.index();
        let mut index = index.lock().await;
        index.rehydrate()?;

        let mut staged = 0;
        for raw_path in paths {
            let path = self.worktree_relative(raw_path)?;

            let tracked = head_files
                .keys()
                .chain(index.staged_paths().iter())
                .filter(|tracked| tracked.starts_with(&path))
                .cloned()
                .collect::<BTreeSet<_>>();

            let files = if self.workspace().exists(&path) {
                self.workspace().list_files_under(&path, &ignore)?
            } else if tracked.is_empty() {
                anyhow::bail!("pathspec '{}' did not match any files", raw_path);
            } else {
                Vec::new()
            };

            for file in tracked.iter().filter(|file| !self.workspace().is_file(file)) {
                if head_files.contains_key(file) {
                    index.stage_delete(file)?;
                } else {
                    index.unstage(file);
                }
                trace!(path = %file.display(), "staged deletion");
            }

            for file in files {
                let current = self.workspace().hash_file(&file)?;
                if head_files.get(&file) == Some(&current) {
                    index.unstage(&file);
                    continue;
                }
                if index.get(&file).and_then(|change| change.entry()) == Some(&current) {
                    continue;
                }

                let data = self.workspace().read_file(&file)?;
                let oid = self.database().put_blob(data)?;
                index.stage(&file, oid, self.workspace().file_mode(&file))?;
                staged += 1;
            }
        }

        index.write_updates()?;
        debug!(staged, "updated index");

        Ok(())
    }

    /// A command-line path as a path inside the working tree
    pub(crate) fn worktree_relative(&self, raw_path: &str) -> anyhow::Result<PathBuf> {
        let path = Path::new(raw_path);
        let relative = if path.is_absolute() {
            path.strip_prefix(self.path())
                .map_err(|_| anyhow::anyhow!("'{}' is outside the repository", raw_path))?
                .to_path_buf()
        } else {
            path.components()
                .filter(|component| !matches!(component, std::path::Component::CurDir))
                .collect()
        };

        Ok(relative)
    }
}
