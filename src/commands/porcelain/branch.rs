use crate::areas::repository::Repository;
use crate::artifacts::branch::head::Head;
use colored::Colorize;
use std::io::Write;

impl Repository {
    pub fn create_branch_command(&self, name: &str, start: Option<&str>) -> anyhow::Result<()> {
        let oid = self.create_branch(name, start)?;

        writeln!(
            self.writer(),
            "Created branch {} at {}",
            name,
            oid.to_short_oid()
        )?;

        Ok(())
    }

    /// All branches in name order, the current one starred
    pub fn list_branches_command(&self, long: bool) -> anyhow::Result<()> {
        let current = match self.refs().read_head()? {
            Head::Branch(name) => Some(name),
            Head::Detached(oid) => {
                writeln!(
                    self.writer(),
                    "* {}",
                    format!("(HEAD detached at {})", oid.to_short_oid()).green()
                )?;
                None
            }
        };

        for record in self.list_branches()? {
            let is_current = current.as_ref() == Some(&record.name);
            let name = if is_current {
                format!("* {}", record.name.to_string().green())
            } else {
                format!("  {}", record.name)
            };

            if long {
                let commit = self.database().load_commit(&record.oid)?;
                writeln!(
                    self.writer(),
                    "{} {} {}",
                    name,
                    record.oid.to_short_oid(),
                    commit.short_message()
                )?;
            } else {
                writeln!(self.writer(), "{name}")?;
            }
        }

        Ok(())
    }

    pub fn delete_branch_command(&self, name: &str) -> anyhow::Result<()> {
        let oid = self.delete_branch(name)?;

        writeln!(
            self.writer(),
            "Deleted branch {} (was {}).",
            name,
            oid.to_short_oid()
        )?;

        Ok(())
    }
}
