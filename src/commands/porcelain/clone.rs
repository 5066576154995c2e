use crate::areas::repository::Repository;
use std::io::Write;
use std::path::Path;

impl Repository {
    pub fn clone_command(&self, target: &Path) -> anyhow::Result<()> {
        let clone = self.clone_into(target)?;

        writeln!(
            self.writer(),
            "Cloned repository into {}",
            clone.path().display()
        )?;

        Ok(())
    }
}
