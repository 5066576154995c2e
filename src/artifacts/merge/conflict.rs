use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::object_id::ObjectId;
use derive_new::new;
use std::path::PathBuf;

/// A path both sides changed in different ways
///
/// `None` on a side means the file is absent there (never existed or was removed).
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Conflict {
    pub path: PathBuf,
    pub base: Option<DatabaseEntry>,
    pub ours: Option<DatabaseEntry>,
    pub theirs: Option<DatabaseEntry>,
}

impl Conflict {
    /// Short label for conflict listings, e.g. "both modified"
    pub fn describe(&self) -> &'static str {
        match (&self.base, &self.ours, &self.theirs) {
            (None, Some(_), Some(_)) => "both added",
            (Some(_), Some(_), Some(_)) => "both modified",
            (None, Some(_), None) => "added by us",
            (None, None, Some(_)) => "added by them",
            (_, None, Some(_)) => "deleted by us",
            (_, Some(_), None) => "deleted by them",
            (_, None, None) => "file/directory",
        }
    }
}

/// Everything needed to present a conflicted merge and conclude it later
///
/// `accepted` holds the non-conflicting outcome per path (`None` for removals),
/// which a caller can stage before the conflicts are resolved. The next commit
/// made with `theirs` recorded as merge head gets `(ours, theirs)` as parents.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct MergeConflicts {
    pub ours: ObjectId,
    pub theirs: ObjectId,
    pub base: ObjectId,
    pub conflicts: Vec<Conflict>,
    pub accepted: Vec<(PathBuf, Option<DatabaseEntry>)>,
}

impl MergeConflicts {
    pub fn paths(&self) -> Vec<PathBuf> {
        self.conflicts
            .iter()
            .map(|conflict| conflict.path.clone())
            .collect()
    }
}
