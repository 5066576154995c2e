use crate::artifacts::diff::tree_diff::ChangeKind;
use colored::Colorize;

const LABEL_WIDTH: usize = 8;

/// How a working tree file differs from what the next commit would record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WorkspaceChange {
    Modified,
    Deleted,
}

impl WorkspaceChange {
    fn code(&self) -> char {
        match self {
            WorkspaceChange::Modified => 'M',
            WorkspaceChange::Deleted => 'D',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileChangeType {
    /// Staged relative to HEAD
    Staged(ChangeKind),
    Workspace(WorkspaceChange),
}

impl FileChangeType {
    pub fn label(&self) -> &'static str {
        match self {
            FileChangeType::Staged(ChangeKind::Added) => "new file:   ",
            FileChangeType::Staged(ChangeKind::Modified)
            | FileChangeType::Workspace(WorkspaceChange::Modified) => "modified:   ",
            FileChangeType::Staged(ChangeKind::Removed)
            | FileChangeType::Workspace(WorkspaceChange::Deleted) => "deleted:    ",
        }
    }
}

impl std::fmt::Display for FileChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FileChangeType::Staged(_) => self.label().green(),
            FileChangeType::Workspace(_) => self.label().red(),
        };
        write!(f, "{:>width$}{}", "", label, width = LABEL_WIDTH)
    }
}

/// Both sides of a tracked file's status, as in `XY path`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct FileChange {
    pub staged: Option<ChangeKind>,
    pub workspace: Option<WorkspaceChange>,
}

impl FileChange {
    pub fn porcelain_code(&self) -> String {
        let staged = self.staged.map_or(' ', |kind| kind.status_char());
        let workspace = self.workspace.map_or(' ', |change| change.code());
        format!("{staged}{workspace}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some(ChangeKind::Added), None, "A ")]
    #[case(None, Some(WorkspaceChange::Deleted), " D")]
    #[case(Some(ChangeKind::Modified), Some(WorkspaceChange::Modified), "MM")]
    fn porcelain_codes(
        #[case] staged: Option<ChangeKind>,
        #[case] workspace: Option<WorkspaceChange>,
        #[case] expected: &str,
    ) {
        assert_eq!(FileChange { staged, workspace }.porcelain_code(), expected);
    }
}
