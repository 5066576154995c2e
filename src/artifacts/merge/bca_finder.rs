//! Merge-base search
//!
//! The merge base of two tips is found by walking both histories with
//! `AncestorWalk` and taking, from the tip with fewer ancestors, the first commit
//! of its walk that also belongs to the other tip's history. Because the walk is
//! topological, that commit is never an ancestor of another common ancestor seen
//! from the same side.
//!
//! When both tips have the same number of ancestors each side proposes its own
//! candidate and the one with the lexicographically smallest digest wins. This
//! makes criss-cross histories (several equally good bases) resolve to one base
//! deterministically, whichever way round the merge is run.

use crate::artifacts::log::rev_list::AncestorWalk;
use crate::artifacts::objects::commit::SlimCommit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::RepoResult;
use tracing::trace;

/// Finds the best common ancestor of two commits
///
/// Commits are pulled through `commit_loader`, so the finder works the same over the
/// on-disk store and over in-memory graphs.
pub struct BCAFinder<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> RepoResult<SlimCommit>,
{
    commit_loader: CommitLoaderFn,
}

impl<CommitLoaderFn> BCAFinder<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> RepoResult<SlimCommit>,
{
    pub fn new(commit_loader: CommitLoaderFn) -> Self {
        Self { commit_loader }
    }

    /// `None` when the two histories share no commit
    pub fn find_best_common_ancestor(
        &self,
        source_commit_id: &ObjectId,
        target_commit_id: &ObjectId,
    ) -> RepoResult<Option<ObjectId>> {
        if source_commit_id == target_commit_id {
            return Ok(Some(source_commit_id.clone()));
        }

        let source_walk = self.walk(source_commit_id)?;
        let target_walk = self.walk(target_commit_id)?;

        trace!(
            source = %source_commit_id,
            target = %target_commit_id,
            source_ancestors = source_walk.ancestor_count(),
            target_ancestors = target_walk.ancestor_count(),
            "searching merge base"
        );

        let best = match source_walk
            .ancestor_count()
            .cmp(&target_walk.ancestor_count())
        {
            std::cmp::Ordering::Less => Self::first_shared(source_walk, &target_walk),
            std::cmp::Ordering::Greater => Self::first_shared(target_walk, &source_walk),
            std::cmp::Ordering::Equal => {
                let from_source = Self::first_shared(source_walk.clone(), &target_walk);
                let from_target = Self::first_shared(target_walk, &source_walk);
                match (from_source, from_target) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                }
            }
        };

        trace!(base = ?best.as_ref().map(ObjectId::to_short_oid), "merge base chosen");

        Ok(best)
    }

    /// True when `ancestor` is reachable from `descendant` (or equal to it)
    pub fn is_ancestor(&self, ancestor: &ObjectId, descendant: &ObjectId) -> RepoResult<bool> {
        if ancestor == descendant {
            return Ok(true);
        }

        Ok(self.walk(descendant)?.contains(ancestor))
    }

    fn walk(&self, start: &ObjectId) -> RepoResult<AncestorWalk> {
        AncestorWalk::new(start, &self.commit_loader)
    }

    fn first_shared(mut walk: AncestorWalk, other: &AncestorWalk) -> Option<ObjectId> {
        walk.find(|oid| other.contains(oid))
    }
}
