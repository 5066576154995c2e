use crate::areas::repository::Repository;
use crate::artifacts::branch::head::Head;
use crate::artifacts::status::status_info::{ChangeSet, StatusInfo};
use colored::Colorize;
use std::io::Write;

impl Repository {
    pub async fn status(&self, porcelain: bool) -> anyhow::Result<()> {
        let status = self.status_info().await?;

        if porcelain {
            self.print_porcelain_format(&status)
        } else {
            self.print_long_format(&status)
        }
    }

    fn print_porcelain_format(&self, status: &StatusInfo) -> anyhow::Result<()> {
        for (path, change) in status.changed_files() {
            writeln!(self.writer(), "{} {}", change.porcelain_code(), path.display())?;
        }
        for path in &status.untracked_files {
            writeln!(self.writer(), "?? {}", path.display())?;
        }

        Ok(())
    }

    fn print_long_format(&self, status: &StatusInfo) -> anyhow::Result<()> {
        match self.refs().read_head()? {
            Head::Branch(name) => writeln!(self.writer(), "On branch {name}")?,
            Head::Detached(oid) => {
                writeln!(self.writer(), "HEAD detached at {}", oid.to_short_oid())?
            }
        }
        if self.refs().read_merge_head()?.is_some() {
            writeln!(self.writer(), "You have unmerged paths.")?;
        }
        writeln!(self.writer())?;

        self.print_changeset("Changes to be committed:", &status.staged_changeset)?;
        self.print_changeset("Changes not staged for commit:", &status.workspace_changeset)?;

        if !status.untracked_files.is_empty() {
            writeln!(self.writer(), "Untracked files:")?;
            for path in &status.untracked_files {
                writeln!(self.writer(), "\t{}", path.display().to_string().red())?;
            }
            writeln!(self.writer())?;
        }

        if status.is_clean() {
            writeln!(self.writer(), "nothing to commit, working tree clean")?;
        } else if status.staged_changeset.is_empty() {
            writeln!(self.writer(), "no changes added to commit")?;
        }

        Ok(())
    }

    fn print_changeset(&self, title: &str, changeset: &ChangeSet) -> anyhow::Result<()> {
        if changeset.is_empty() {
            return Ok(());
        }

        writeln!(self.writer(), "{title}")?;
        for (path, change) in changeset {
            writeln!(self.writer(), "{}{}", change, path.display())?;
        }
        writeln!(self.writer())?;

        Ok(())
    }
}
