use crate::areas::repository::Repository;
use crate::artifacts::merge::outcome::MergeOutcome;
use crate::artifacts::objects::commit::Author;
use crate::errors::RepoError;
use std::io::Write;

impl Repository {
    /// Merge `source` into the current branch
    ///
    /// On conflicts the clean part of the merge is staged, conflicted files get
    /// inline markers and the command fails; committing after resolving them
    /// concludes the merge.
    pub async fn merge_command(&self, source: &str, message: Option<&str>) -> anyhow::Result<()> {
        let author = Author::load_from_env()?;

        match self.merge(source, author, message).await {
            Ok(MergeOutcome::AlreadyUpToDate { .. }) => {
                writeln!(self.writer(), "Already up to date.")?;
            }
            Ok(MergeOutcome::FastForward { from, to }) => {
                writeln!(
                    self.writer(),
                    "Updating {}..{}\nFast-forward",
                    from.to_short_oid(),
                    to.to_short_oid()
                )?;
            }
            Ok(MergeOutcome::Merged { commit, base }) => {
                writeln!(
                    self.writer(),
                    "Merge made by the 'three-way' strategy (base {}).\n[{}] {}",
                    base.to_short_oid(),
                    commit.to_short_oid(),
                    self.database().load_commit(&commit)?.short_message()
                )?;
            }
            Err(RepoError::MergeConflict(conflicts)) => {
                self.record_merge_conflicts(&conflicts, source).await?;

                for conflict in &conflicts.conflicts {
                    writeln!(
                        self.writer(),
                        "CONFLICT ({}): Merge conflict in {}",
                        conflict.describe(),
                        conflict.path.display()
                    )?;
                }
                writeln!(
                    self.writer(),
                    "Automatic merge failed; fix conflicts and then commit the result."
                )?;

                return Err(RepoError::MergeConflict(conflicts).into());
            }
            Err(error) => return Err(error.into()),
        }

        Ok(())
    }
}
