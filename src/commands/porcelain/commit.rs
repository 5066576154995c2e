use crate::areas::repository::Repository;
use crate::artifacts::branch::head::Head;
use crate::artifacts::objects::commit::Author;
use std::io::Write;

impl Repository {
    pub async fn commit(&self, message: &str) -> anyhow::Result<()> {
        let author = Author::load_from_env()?;
        let commit_id = self.commit_staged(author, message).await?;
        let commit = self.database().load_commit(&commit_id)?;

        let location = match self.refs().read_head()? {
            Head::Branch(name) => name.to_string(),
            Head::Detached(_) => "detached HEAD".to_string(),
        };
        let is_root = match commit.parent() {
            Some(_) => "",
            None => " (root-commit)",
        };

        writeln!(
            self.writer(),
            "[{}{} {}] {}",
            location,
            is_root,
            commit_id.to_short_oid(),
            commit.short_message()
        )?;

        Ok(())
    }
}
