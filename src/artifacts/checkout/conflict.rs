use crate::artifacts::database::database_entry::DatabaseEntry;

#[derive(Debug)]
pub struct ConflictMessage {
    pub header: &'static str,
    pub footer: &'static str,
}

impl From<&ConflictType> for ConflictMessage {
    fn from(value: &ConflictType) -> Self {
        match value {
            ConflictType::StaleFile => Self {
                header: "Your local changes to the following files would be overwritten by checkout:",
                footer: "Please commit your changes before you switch branches.",
            },
            ConflictType::StaleDirectory => Self {
                header: "Updating the following directories would lose untracked files in them:",
                footer: "Please move or remove them before you switch branches.",
            },
            ConflictType::UntrackedOverwritten => Self {
                header: "The following untracked working tree files would be overwritten by checkout:",
                footer: "Please move or remove them before you switch branches.",
            },
        }
    }
}

/// Ways a checkout could destroy work that exists only in the working tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConflictType {
    /// A tracked file was edited and the checkout would replace or delete it
    StaleFile,
    /// A directory with untracked files sits where a file has to go
    StaleDirectory,
    /// An untracked file sits where the checkout writes a file or a directory
    UntrackedOverwritten,
}

impl ConflictType {
    pub fn get_conflict_type(
        is_directory: bool,
        old_entry: Option<&DatabaseEntry>,
    ) -> ConflictType {
        if is_directory {
            ConflictType::StaleDirectory
        } else if old_entry.is_some() {
            ConflictType::StaleFile
        } else {
            ConflictType::UntrackedOverwritten
        }
    }
}
