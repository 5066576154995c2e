use crate::areas::repository::Repository;
use std::io::Write;

impl Repository {
    pub fn init(&self) -> anyhow::Result<()> {
        self.init_storage()?;

        writeln!(
            self.writer(),
            "Initialized empty repository in {}",
            self.repo_path().display()
        )?;

        Ok(())
    }
}
