use crate::areas::repository::Repository;
use crate::artifacts::branch::head::Head;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use colored::Colorize;
use std::collections::HashMap;
use std::io::Write;

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub oneline: bool,
    pub max_count: Option<usize>,
}

impl Repository {
    /// History of `revision` (HEAD by default), children before parents
    pub fn log(&self, revision: Option<&str>, opts: &LogOptions) -> anyhow::Result<()> {
        let start = match revision {
            Some(revision) => self.resolve(revision)?,
            None => match self.head_commit()? {
                Some(oid) => oid,
                None => {
                    let branch = match self.refs().read_head()? {
                        Head::Branch(name) => name.to_string(),
                        Head::Detached(oid) => oid.to_string(),
                    };
                    anyhow::bail!("your current branch '{branch}' does not have any commits yet");
                }
            },
        };

        let decorations = self.branch_decorations()?;
        let walk = self
            .database()
            .walk_ancestors(&start)?
            .take(opts.max_count.unwrap_or(usize::MAX));

        for (position, oid) in walk.enumerate() {
            let commit = self.database().load_commit(&oid)?;
            let decoration = decorations
                .get(&oid)
                .map(|names| format!(" ({})", names.join(", ")))
                .unwrap_or_default();

            if opts.oneline {
                self.show_commit_oneline(&oid, &commit, &decoration)?;
            } else {
                if position > 0 {
                    writeln!(self.writer())?;
                }
                self.show_commit_medium(&oid, &commit, &decoration)?;
            }
        }

        Ok(())
    }

    fn branch_decorations(&self) -> anyhow::Result<HashMap<ObjectId, Vec<String>>> {
        let mut decorations = HashMap::<ObjectId, Vec<String>>::new();

        for record in self.list_branches()? {
            decorations
                .entry(record.oid)
                .or_default()
                .push(record.name.to_string());
        }

        Ok(decorations)
    }

    fn show_commit_medium(
        &self,
        oid: &ObjectId,
        commit: &Commit,
        decoration: &str,
    ) -> anyhow::Result<()> {
        writeln!(
            self.writer(),
            "{}{}",
            format!("commit {oid}").yellow(),
            decoration.cyan()
        )?;
        if commit.is_merge() {
            let parents = commit
                .parents()
                .iter()
                .map(ObjectId::to_short_oid)
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(self.writer(), "Merge: {parents}")?;
        }
        writeln!(self.writer(), "Author: {}", commit.author().display_name())?;
        writeln!(
            self.writer(),
            "Date:   {}",
            commit.author().readable_timestamp()
        )?;
        writeln!(self.writer())?;
        for message_line in commit.message().lines() {
            writeln!(self.writer(), "    {message_line}")?;
        }

        Ok(())
    }

    fn show_commit_oneline(
        &self,
        oid: &ObjectId,
        commit: &Commit,
        decoration: &str,
    ) -> anyhow::Result<()> {
        writeln!(
            self.writer(),
            "{}{} {}",
            oid.to_short_oid().yellow(),
            decoration.cyan(),
            commit.short_message()
        )?;

        Ok(())
    }
}
