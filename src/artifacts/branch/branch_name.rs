use crate::artifacts::branch::{DEFAULT_BRANCH, INVALID_BRANCH_NAME_REGEX};
use crate::errors::{RepoError, RepoResult};
use anyhow::Context;

const REF_PREFIX: &str = "refs/heads/";

/// A validated branch name, e.g. `main` or `feature/login`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchName(String);

impl BranchName {
    pub fn try_parse(name: impl Into<String>) -> RepoResult<Self> {
        let name = name.into();
        let re = regex::Regex::new(INVALID_BRANCH_NAME_REGEX)
            .with_context(|| format!("invalid branch name regex: {INVALID_BRANCH_NAME_REGEX}"))?;

        if name.is_empty() || name == "HEAD" || re.is_match(&name) {
            return Err(RepoError::InvalidBranchName(name));
        }

        Ok(Self(name))
    }

    /// Parse the target of a symbolic ref such as `refs/heads/main`
    pub fn try_parse_ref_path(ref_path: &str) -> RepoResult<Self> {
        let name = ref_path
            .strip_prefix(REF_PREFIX)
            .ok_or_else(|| RepoError::InvalidBranchName(ref_path.to_string()))?;

        Self::try_parse(name)
    }

    pub fn default_branch() -> Self {
        Self(DEFAULT_BRANCH.to_string())
    }

    /// `refs/heads/<name>`
    pub fn ref_path(&self) -> String {
        format!("{REF_PREFIX}{}", self.0)
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
