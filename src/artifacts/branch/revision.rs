use crate::areas::database::Database;
use crate::areas::refs::Refs;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::branch::{ANCESTOR_REGEX, PARENT_REGEX, REF_ALIASES};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::{MIN_ABBREV_LENGTH, OBJECT_ID_LENGTH};
use crate::errors::{RepoError, RepoResult};
use anyhow::Context;

/// A way of naming a commit
///
/// - `HEAD` (alias `@`), a branch name, or a full or abbreviated commit id
/// - `<rev>^`: first parent of `<rev>`
/// - `<rev>~<n>`: n-th first-parent ancestor of `<rev>`
///
/// A branch name wins over a commit id spelled the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    Ref(String),
    Parent(Box<Revision>),
    Ancestor(Box<Revision>, usize),
}

impl Revision {
    pub fn try_parse(revision: &str) -> RepoResult<Revision> {
        let parent_re = regex::Regex::new(PARENT_REGEX)
            .with_context(|| format!("invalid parent regex: {PARENT_REGEX}"))?;
        let ancestor_re = regex::Regex::new(ANCESTOR_REGEX)
            .with_context(|| format!("invalid ancestor regex: {ANCESTOR_REGEX}"))?;

        if let Some(captures) = parent_re.captures(revision) {
            let base = Self::try_parse(&captures[1])?;
            Ok(Revision::Parent(Box::new(base)))
        } else if let Some(captures) = ancestor_re.captures(revision) {
            let generations = captures[2]
                .parse::<usize>()
                .map_err(|_| RepoError::UnknownRef(revision.to_string()))?;
            let base = Self::try_parse(&captures[1])?;
            Ok(Revision::Ancestor(Box::new(base), generations))
        } else if revision.is_empty() {
            Err(RepoError::UnknownRef(revision.to_string()))
        } else {
            let name = *REF_ALIASES.get(revision).unwrap_or(&revision);
            Ok(Revision::Ref(name.to_string()))
        }
    }

    /// The commit this revision names
    ///
    /// Anything that does not lead to a commit is an `UnknownRef`; store faults
    /// other than a missing object are passed through.
    pub fn resolve(&self, refs: &Refs, database: &Database) -> RepoResult<ObjectId> {
        match self {
            Revision::Ref(name) => Self::resolve_name(name, refs, database),
            Revision::Parent(base) => {
                let oid = base.resolve(refs, database)?;
                Self::first_parent(&oid, database)
            }
            Revision::Ancestor(base, generations) => {
                let mut oid = base.resolve(refs, database)?;
                for _ in 0..*generations {
                    oid = Self::first_parent(&oid, database)?;
                }
                Ok(oid)
            }
        }
    }

    fn resolve_name(name: &str, refs: &Refs, database: &Database) -> RepoResult<ObjectId> {
        let unknown = || RepoError::UnknownRef(name.to_string());

        if name == "HEAD" {
            return refs.head_commit()?.ok_or_else(unknown);
        }

        if let Ok(branch) = BranchName::try_parse(name)
            && let Some(oid) = refs.read_branch(&branch)?
        {
            return Ok(oid);
        }

        if !Self::looks_like_oid(name) {
            return Err(unknown());
        }

        let commits = database
            .find_objects_by_prefix(name)?
            .into_iter()
            .filter(|oid| matches!(database.object_type(oid), Ok(ObjectType::Commit)))
            .collect::<Vec<_>>();

        match commits.as_slice() {
            [oid] => Ok(oid.clone()),
            _ => Err(unknown()),
        }
    }

    fn first_parent(oid: &ObjectId, database: &Database) -> RepoResult<ObjectId> {
        database
            .load_commit(oid)?
            .parent()
            .cloned()
            .ok_or_else(|| RepoError::UnknownRef(format!("{}^", oid.to_short_oid())))
    }

    pub fn looks_like_oid(s: &str) -> bool {
        (MIN_ABBREV_LENGTH..=OBJECT_ID_LENGTH).contains(&s.len())
            && s.chars().all(|c| c.is_ascii_hexdigit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn reference(name: &str) -> Revision {
        Revision::Ref(name.to_string())
    }

    #[rstest]
    #[case("main", reference("main"))]
    #[case("@", reference("HEAD"))]
    #[case("main^", Revision::Parent(Box::new(reference("main"))))]
    #[case("HEAD~3", Revision::Ancestor(Box::new(reference("HEAD")), 3))]
    #[case(
        "topic~2^",
        Revision::Parent(Box::new(Revision::Ancestor(Box::new(reference("topic")), 2)))
    )]
    fn parses_suffixes(#[case] raw: &str, #[case] expected: Revision) {
        assert_eq!(Revision::try_parse(raw).unwrap(), expected);
    }

    #[test]
    fn empty_revision_is_unknown() {
        assert!(matches!(Revision::try_parse(""), Err(RepoError::UnknownRef(_))));
    }

    #[rstest]
    #[case("abcd", true)]
    #[case("abc", false)]
    #[case("abcg", false)]
    fn short_hex_strings_look_like_ids(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(Revision::looks_like_oid(raw), expected);
    }
}
