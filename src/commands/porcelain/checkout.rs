use crate::areas::repository::Repository;
use crate::artifacts::branch::head::Head;
use std::io::Write;

impl Repository {
    pub async fn checkout_command(&self, target: &str) -> anyhow::Result<()> {
        let previous = self.refs().read_head()?;
        let head = self.checkout(target).await?;

        match head {
            Head::Branch(name) if previous.branch() == Some(&name) => {
                writeln!(self.writer(), "Already on '{name}'")?;
            }
            Head::Branch(name) => {
                writeln!(self.writer(), "Switched to branch '{name}'")?;
            }
            Head::Detached(oid) => {
                let commit = self.database().load_commit(&oid)?;
                writeln!(
                    self.writer(),
                    "HEAD is now at {} {}",
                    oid.to_short_oid(),
                    commit.short_message()
                )?;
            }
        }

        Ok(())
    }
}
