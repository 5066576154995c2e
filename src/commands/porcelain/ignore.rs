use crate::areas::repository::Repository;
use std::io::Write;

impl Repository {
    pub fn add_ignore(&self, patterns: &[String]) -> anyhow::Result<()> {
        for pattern in self.add_ignore_patterns(patterns)? {
            writeln!(self.writer(), "Ignoring '{pattern}'")?;
        }

        Ok(())
    }

    /// Working tree files the ignore patterns let through
    pub fn ls_files(&self) -> anyhow::Result<()> {
        let ignore = self.ignore_patterns()?;

        for path in self.workspace().list_files(&ignore)? {
            writeln!(self.writer(), "{}", path.display())?;
        }

        Ok(())
    }
}
