use crate::artifacts::merge::conflict::MergeConflicts;
use crate::artifacts::objects::object_id::ObjectId;

/// Result of a merge that did not stop on conflicts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Source already contained in the current branch; nothing changed
    AlreadyUpToDate { head: ObjectId },
    /// Current branch moved forward to the source tip without a new commit
    FastForward { from: ObjectId, to: ObjectId },
    /// A two-parent commit was created on the current branch
    Merged { commit: ObjectId, base: ObjectId },
}

/// What a merge will do, computed before anything but objects is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergePlan {
    AlreadyUpToDate {
        head: ObjectId,
    },
    FastForward {
        from: ObjectId,
        to: ObjectId,
    },
    /// Clean three-way merge; `tree` is already stored
    ThreeWay {
        ours: ObjectId,
        theirs: ObjectId,
        base: ObjectId,
        tree: ObjectId,
    },
    Conflicted(Box<MergeConflicts>),
}
