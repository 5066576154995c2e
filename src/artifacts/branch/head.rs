use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{RepoError, RepoResult};
use anyhow::Context;
use derive_new::new;

/// `ref: refs/heads/<name>`
const SYMREF_REGEX: &str = r"^ref: (.+)$";

/// What the HEAD file points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// A branch, which may not have any commit yet
    Branch(BranchName),
    /// A commit directly
    Detached(ObjectId),
}

impl Head {
    pub fn try_parse(content: &str) -> RepoResult<Self> {
        let content = content.trim();
        let re = regex::Regex::new(SYMREF_REGEX)
            .with_context(|| format!("invalid symref regex: {SYMREF_REGEX}"))?;

        match re.captures(content) {
            Some(captures) => Ok(Head::Branch(BranchName::try_parse_ref_path(&captures[1])?)),
            None => ObjectId::try_parse(content.to_string())
                .map(Head::Detached)
                .map_err(|_| RepoError::UnknownRef(content.to_string())),
        }
    }

    pub fn branch(&self) -> Option<&BranchName> {
        match self {
            Head::Branch(name) => Some(name),
            Head::Detached(_) => None,
        }
    }

    /// File content for HEAD
    pub fn to_content(&self) -> String {
        match self {
            Head::Branch(name) => format!("ref: {}\n", name.ref_path()),
            Head::Detached(oid) => format!("{oid}\n"),
        }
    }
}

/// A named ref and the commit it points to, as exchanged by clone
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct RefRecord {
    pub name: BranchName,
    pub oid: ObjectId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn branch_head_reads_back() {
        let head = Head::Branch(BranchName::try_parse("feature/x").unwrap());

        assert_eq!(head.to_content(), "ref: refs/heads/feature/x\n");
        assert_eq!(Head::try_parse(&head.to_content()).unwrap(), head);
    }

    #[test]
    fn detached_head_reads_back() {
        let oid = ObjectId::try_parse("ab".repeat(32)).unwrap();
        let head = Head::Detached(oid.clone());

        assert_eq!(Head::try_parse(&head.to_content()).unwrap(), head);
        assert_eq!(head.branch(), None);
    }

    #[test]
    fn garbage_is_an_unknown_ref() {
        assert!(matches!(Head::try_parse("nonsense"), Err(RepoError::UnknownRef(_))));
    }
}
