use crate::areas::repository::Repository;
use crate::artifacts::diff::tree_diff::{ChangeKind, DiffFilter};
use colored::Colorize;
use std::io::Write;

impl Repository {
    /// One `<status> <path>` line per changed file between two revisions
    pub fn diff(&self, old: &str, new: &str, filter: Option<&str>) -> anyhow::Result<()> {
        let filter = match filter {
            Some(filter) => DiffFilter::try_parse(filter)
                .ok_or_else(|| anyhow::anyhow!("invalid diff filter '{filter}'"))?,
            None => DiffFilter::all(),
        };

        let changes = self.diff_revisions(old, new)?;
        for change in changes
            .iter()
            .filter(|change| change.kind.matches_filter(filter))
        {
            let status = change.kind.status_char().to_string();
            let status = match change.kind {
                ChangeKind::Added => status.green(),
                ChangeKind::Removed => status.red(),
                ChangeKind::Modified => status.yellow(),
            };
            writeln!(self.writer(), "{}\t{}", status, change.path.display())?;
        }

        Ok(())
    }
}
