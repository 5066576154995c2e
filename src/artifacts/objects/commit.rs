//! Commit object
//!
//! A commit records one snapshot of the tree together with the commits it was
//! derived from: none for a root commit, one for a normal commit and two for a
//! merge. Parents are part of the serialized form, so two commits that differ
//! only in their ancestry still get different ids.
//!
//! ## Format
//!
//! On disk:
//! ```text
//! commit <size>\0
//! tree <tree-id>
//! parent <parent-id>
//! author <name> <email> <timestamp> <timezone>
//!
//! <commit message>
//! ```

use crate::artifacts::objects::object::{Object, Packable, Unpackable, frame};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use std::io::BufRead;

pub const AUTHOR_NAME_VAR: &str = "SVCS_AUTHOR_NAME";
pub const AUTHOR_EMAIL_VAR: &str = "SVCS_AUTHOR_EMAIL";
pub const AUTHOR_DATE_VAR: &str = "SVCS_AUTHOR_DATE";

/// Author identity and the moment the commit was made
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    name: String,
    email: String,
    timestamp: chrono::DateTime<chrono::FixedOffset>,
}

impl Author {
    /// Create a new author stamped with the current local time
    pub fn new(name: String, email: String) -> Self {
        Author {
            name,
            email,
            timestamp: chrono::Local::now().fixed_offset(),
        }
    }

    pub fn new_with_timestamp(
        name: String,
        email: String,
        timestamp: chrono::DateTime<chrono::FixedOffset>,
    ) -> Self {
        Author {
            name,
            email,
            timestamp,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// "Name <email@example.com>"
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// "Name <email> seconds timezone", as stored in the commit header
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

    /// Load author information from the environment
    ///
    /// Reads `SVCS_AUTHOR_NAME`, `SVCS_AUTHOR_EMAIL` and optionally `SVCS_AUTHOR_DATE`
    /// (RFC 2822 or `%Y-%m-%d %H:%M:%S %z`). Without a date the current time is used.
    pub fn load_from_env() -> anyhow::Result<Self> {
        let name =
            std::env::var(AUTHOR_NAME_VAR).with_context(|| format!("{AUTHOR_NAME_VAR} not set"))?;
        let email = std::env::var(AUTHOR_EMAIL_VAR)
            .with_context(|| format!("{AUTHOR_EMAIL_VAR} not set"))?;

        match std::env::var(AUTHOR_DATE_VAR) {
            Ok(date) => {
                let timestamp = parse_author_date(&date)
                    .with_context(|| format!("{AUTHOR_DATE_VAR} is not a valid date: {date}"))?;
                Ok(Author::new_with_timestamp(name, email, timestamp))
            }
            Err(_) => Ok(Author::new(name, email)),
        }
    }

    /// "Mon Jan 1 12:34:56 2024 +0000"
    pub fn readable_timestamp(&self) -> String {
        self.timestamp
            .format("%a %b %-d %H:%M:%S %Y %z")
            .to_string()
    }

    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.timestamp
    }
}

fn parse_author_date(date: &str) -> anyhow::Result<chrono::DateTime<chrono::FixedOffset>> {
    chrono::DateTime::parse_from_rfc2822(date)
        .or_else(|_| chrono::DateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S %z"))
        .map_err(Into::into)
}

impl TryFrom<&str> for Author {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // "name <email> timestamp timezone", split from the right
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            return Err(anyhow::anyhow!("Invalid author format"));
        }

        let timezone = parts[0];
        let seconds = parts[1]
            .parse::<i64>()
            .map_err(|_| anyhow::anyhow!("Invalid timestamp"))?;
        let name_email_part = parts[2];

        let email_start = name_email_part
            .find('<')
            .ok_or_else(|| anyhow::anyhow!("Invalid author format: missing '<'"))?;
        let email_end = name_email_part
            .rfind('>')
            .ok_or_else(|| anyhow::anyhow!("Invalid author format: missing '>'"))?;

        let name = name_email_part[..email_start].trim().to_string();
        let email = name_email_part[email_start + 1..email_end].to_string();

        let offset = chrono::DateTime::parse_from_str(
            &format!("1970-01-01 00:00:00 {timezone}"),
            "%Y-%m-%d %H:%M:%S %z",
        )
        .map_err(|_| anyhow::anyhow!("Invalid timezone"))?
        .offset()
        .to_owned();
        let timestamp = chrono::DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| anyhow::anyhow!("Invalid timestamp"))?
            .with_timezone(&offset);

        Ok(Author {
            name,
            email,
            timestamp,
        })
    }
}

/// The parts of a commit needed for graph traversal
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SlimCommit {
    pub oid: ObjectId,
    pub parents: Vec<ObjectId>,
    pub timestamp: chrono::DateTime<chrono::FixedOffset>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    /// Empty for a root commit, two entries for a merge
    parents: Vec<ObjectId>,
    tree_oid: ObjectId,
    author: Author,
    message: String,
}

impl Commit {
    pub fn new(
        parents: Vec<ObjectId>,
        tree_oid: ObjectId,
        author: Author,
        message: String,
    ) -> Self {
        Commit {
            parents,
            tree_oid,
            author,
            message,
        }
    }

    /// First line of the message, for one-line listings
    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.author.timestamp()
    }

    pub fn to_slim(&self, oid: ObjectId) -> SlimCommit {
        SlimCommit {
            oid,
            parents: self.parents.clone(),
            timestamp: self.timestamp(),
        }
    }

    fn header_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("tree {}", self.tree_oid)];
        for parent in &self.parents {
            lines.push(format!("parent {parent}"));
        }
        lines.push(format!("author {}", self.author.display()));
        lines.push(String::new());
        lines.push(self.message.to_string());

        lines
    }
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let content = self.header_lines().join("\n");
        frame(self.object_type(), content.as_bytes())
    }
}

impl Unpackable for Commit {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let content = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;

        let content = String::from_utf8(content)?;
        let (header, message) = content
            .split_once("\n\n")
            .context("Invalid commit object: missing message separator")?;
        let mut lines = header.lines();

        let tree_oid = lines
            .next()
            .and_then(|line| line.strip_prefix("tree "))
            .context("Invalid commit object: invalid tree line")?;
        let tree_oid = ObjectId::try_parse(tree_oid.to_string())?;

        let mut parents = Vec::new();
        let mut next_line = lines
            .next()
            .context("Invalid commit object: missing author line")?;

        while let Some(parent_oid) = next_line.strip_prefix("parent ") {
            parents.push(ObjectId::try_parse(parent_oid.to_string())?);
            next_line = lines
                .next()
                .context("Invalid commit object: missing author line")?;
        }

        let author = next_line
            .strip_prefix("author ")
            .context("Invalid commit object: invalid author line")?;
        let author = Author::try_from(author)?;

        Ok(Self::new(parents, tree_oid, author, message.to_string()))
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        self.header_lines().join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::hasher;
    use pretty_assertions::assert_eq;

    fn author() -> Author {
        let timestamp =
            chrono::DateTime::parse_from_str("2024-03-01 10:00:00 +0200", "%Y-%m-%d %H:%M:%S %z")
                .unwrap();
        Author::new_with_timestamp("Ada".to_string(), "ada@example.com".to_string(), timestamp)
    }

    #[test]
    fn author_header_survives_a_reload() {
        let author = author();
        let parsed = Author::try_from(author.display().as_str()).unwrap();

        assert_eq!(parsed, author);
        assert_eq!(parsed.readable_timestamp(), "Fri Mar 1 10:00:00 2024 +0200");
    }

    #[test]
    fn merge_commit_keeps_both_parents_and_multiline_message() {
        let commit = Commit::new(
            vec![hasher::hash(b"ours"), hasher::hash(b"theirs")],
            hasher::hash(b"tree"),
            author(),
            "Merge feature\n\nwith details".to_string(),
        );

        let mut reader = std::io::Cursor::new(commit.serialize().unwrap());
        assert_eq!(
            ObjectType::parse_object_type(&mut reader).unwrap(),
            ObjectType::Commit
        );
        let parsed = Commit::deserialize(reader).unwrap();

        assert_eq!(parsed, commit);
        assert!(parsed.is_merge());
        assert_eq!(parsed.short_message(), "Merge feature");
    }

    #[test]
    fn parents_change_the_commit_id() {
        let root = Commit::new(Vec::new(), hasher::hash(b"tree"), author(), "m".to_string());
        let child = Commit::new(
            vec![hasher::hash(b"p")],
            hasher::hash(b"tree"),
            author(),
            "m".to_string(),
        );

        assert_ne!(root.object_id().unwrap(), child.object_id().unwrap());
    }
}
