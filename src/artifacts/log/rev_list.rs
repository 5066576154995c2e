//! Ancestor traversal
//!
//! `AncestorWalk` yields every commit reachable from a starting commit exactly once,
//! in topological order: a commit is only yielded after all of its reachable
//! descendants. Among the commits that are ready at any point, the newest one goes
//! first and equal timestamps fall back to the smallest digest, so the order is
//! fully deterministic.
//!
//! The reachable graph is loaded up front (parent edges plus a child count per
//! commit); yielding is then a Kahn-style drain of a priority queue.

use crate::artifacts::objects::commit::SlimCommit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::RepoResult;
use chrono::{DateTime, FixedOffset};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

type ReadyKey = (DateTime<FixedOffset>, Reverse<ObjectId>);

#[derive(Debug, Clone)]
pub struct AncestorWalk {
    commits: HashMap<ObjectId, SlimCommit>,
    pending_children: HashMap<ObjectId, usize>,
    ready: BinaryHeap<ReadyKey>,
}

impl AncestorWalk {
    /// Load everything reachable from `start` through `load_commit`
    ///
    /// Any error from the loader (a missing or mistyped parent) aborts the walk.
    pub fn new<F>(start: &ObjectId, load_commit: F) -> RepoResult<Self>
    where
        F: Fn(&ObjectId) -> RepoResult<SlimCommit>,
    {
        let mut commits = HashMap::new();
        let mut pending_children = HashMap::<ObjectId, usize>::new();
        let mut stack = vec![start.clone()];

        while let Some(oid) = stack.pop() {
            if commits.contains_key(&oid) {
                continue;
            }

            let commit = load_commit(&oid)?;
            for parent in &commit.parents {
                *pending_children.entry(parent.clone()).or_default() += 1;
                if !commits.contains_key(parent) {
                    stack.push(parent.clone());
                }
            }
            commits.insert(oid, commit);
        }

        let mut ready = BinaryHeap::new();
        if let Some(start_commit) = commits.get(start) {
            ready.push((start_commit.timestamp, Reverse(start.clone())));
        }

        Ok(AncestorWalk {
            commits,
            pending_children,
            ready,
        })
    }

    /// Number of commits reachable from the start, the start included
    pub fn ancestor_count(&self) -> usize {
        self.commits.len()
    }

    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.commits.contains_key(oid)
    }

    pub fn commit(&self, oid: &ObjectId) -> Option<&SlimCommit> {
        self.commits.get(oid)
    }
}

impl Iterator for AncestorWalk {
    type Item = ObjectId;

    fn next(&mut self) -> Option<Self::Item> {
        let (_, Reverse(oid)) = self.ready.pop()?;
        let parents = self
            .commits
            .get(&oid)
            .map(|commit| commit.parents.clone())
            .unwrap_or_default();

        for parent in parents {
            let Some(pending) = self.pending_children.get_mut(&parent) else {
                continue;
            };
            *pending -= 1;
            // a commit listed twice as parent of the same merge only becomes ready once
            if *pending == 0
                && let Some(parent_commit) = self.commits.get(&parent)
            {
                self.ready.push((parent_commit.timestamp, Reverse(parent)));
            }
        }

        Some(oid)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::errors::RepoError;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use proptest::proptest;
    use rstest::{fixture, rstest};
    use std::collections::HashSet;

    /// In-memory commit graph shared by the traversal and merge-base tests
    #[derive(Debug, Clone, Default)]
    pub(crate) struct InMemoryCommitStore {
        commits: HashMap<ObjectId, SlimCommit>,
    }

    impl InMemoryCommitStore {
        /// Each added commit is one hour newer than the previous one
        pub(crate) fn add_commit(&mut self, name: &str, parents: &[&str]) -> ObjectId {
            let hours = self.commits.len() as i64;
            self.add_commit_at(name, parents, hours * 3600)
        }

        pub(crate) fn add_commit_at(
            &mut self,
            name: &str,
            parents: &[&str],
            offset_seconds: i64,
        ) -> ObjectId {
            let oid = create_oid(name);
            let timestamp = FixedOffset::east_opt(0)
                .unwrap()
                .timestamp_opt(1_640_995_200 + offset_seconds, 0)
                .unwrap();
            self.commits.insert(
                oid.clone(),
                SlimCommit {
                    oid: oid.clone(),
                    parents: parents.iter().map(|parent| create_oid(parent)).collect(),
                    timestamp,
                },
            );

            oid
        }

        pub(crate) fn load(&self, oid: &ObjectId) -> RepoResult<SlimCommit> {
            self.commits
                .get(oid)
                .cloned()
                .ok_or_else(|| RepoError::NotFound(oid.clone()))
        }
    }

    /// Deterministic 64-char id derived from a readable name
    pub(crate) fn create_oid(name: &str) -> ObjectId {
        let mut hex = name
            .as_bytes()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>();
        hex.truncate(64);
        while hex.len() < 64 {
            hex.push('0');
        }

        ObjectId::try_parse(hex).unwrap()
    }

    fn walk(store: &InMemoryCommitStore, start: &str) -> Vec<ObjectId> {
        AncestorWalk::new(&create_oid(start), |oid| store.load(oid))
            .unwrap()
            .collect()
    }

    fn oids(names: &[&str]) -> Vec<ObjectId> {
        names.iter().map(|name| create_oid(name)).collect()
    }

    #[fixture]
    fn diamond() -> InMemoryCommitStore {
        //     a
        //    / \
        //   b   c
        //    \ /
        //     d
        let mut store = InMemoryCommitStore::default();
        store.add_commit("a", &[]);
        store.add_commit("b", &["a"]);
        store.add_commit("c", &["a"]);
        store.add_commit("d", &["b", "c"]);
        store
    }

    #[rstest]
    fn linear_history_is_newest_first() {
        let mut store = InMemoryCommitStore::default();
        store.add_commit("a", &[]);
        store.add_commit("b", &["a"]);
        store.add_commit("c", &["b"]);

        assert_eq!(walk(&store, "c"), oids(&["c", "b", "a"]));
    }

    #[rstest]
    fn diamond_visits_the_shared_root_once_and_last(diamond: InMemoryCommitStore) {
        assert_eq!(walk(&diamond, "d"), oids(&["d", "c", "b", "a"]));
    }

    #[rstest]
    fn descendants_always_precede_ancestors_despite_clock_skew() {
        // b claims to be older than its own parent
        let mut store = InMemoryCommitStore::default();
        store.add_commit_at("a", &[], 7200);
        store.add_commit_at("b", &["a"], 0);
        store.add_commit_at("c", &["b"], 10800);

        assert_eq!(walk(&store, "c"), oids(&["c", "b", "a"]));
    }

    #[rstest]
    fn equal_timestamps_yield_the_smallest_digest_first() {
        let mut store = InMemoryCommitStore::default();
        store.add_commit_at("root", &[], 0);
        store.add_commit_at("y", &["root"], 3600);
        store.add_commit_at("x", &["root"], 3600);
        store.add_commit_at("tip", &["y", "x"], 7200);

        assert_eq!(walk(&store, "tip"), oids(&["tip", "x", "y", "root"]));
    }

    #[rstest]
    fn walk_is_restartable(diamond: InMemoryCommitStore) {
        assert_eq!(walk(&diamond, "d"), walk(&diamond, "d"));
        let walk = AncestorWalk::new(&create_oid("d"), |oid| diamond.load(oid)).unwrap();
        assert_eq!(walk.ancestor_count(), 4);
        assert!(walk.contains(&create_oid("a")));
    }

    /// Commit `i` picks its parents among commits `0..i`; timestamps are random
    /// so parents can claim to be newer than their children
    fn random_history(shape: &[(Vec<proptest::sample::Index>, i64)]) -> InMemoryCommitStore {
        let mut store = InMemoryCommitStore::default();

        for (i, (parent_picks, offset)) in shape.iter().enumerate() {
            let mut parents = if i == 0 {
                Vec::new()
            } else {
                parent_picks
                    .iter()
                    .map(|pick| format!("c{}", pick.index(i)))
                    .collect::<Vec<_>>()
            };
            parents.sort();
            parents.dedup();

            let parents = parents.iter().map(String::as_str).collect::<Vec<_>>();
            store.add_commit_at(&format!("c{i}"), &parents, *offset);
        }

        store
    }

    fn reachable(store: &InMemoryCommitStore, start: &ObjectId) -> HashSet<ObjectId> {
        let mut seen = HashSet::new();
        let mut stack = vec![start.clone()];

        while let Some(oid) = stack.pop() {
            if seen.insert(oid.clone()) {
                stack.extend(store.load(&oid).unwrap().parents);
            }
        }

        seen
    }

    proptest! {
        #[test]
        fn random_histories_are_walked_topologically(
            shape in proptest::collection::vec(
                (
                    proptest::collection::vec(proptest::arbitrary::any::<proptest::sample::Index>(), 0..3),
                    0i64..18_000,
                ),
                1..24,
            )
        ) {
            let store = random_history(&shape);
            let start = create_oid(&format!("c{}", shape.len() - 1));

            let order = AncestorWalk::new(&start, |oid| store.load(oid))
                .unwrap()
                .collect::<Vec<_>>();
            let position = order
                .iter()
                .enumerate()
                .map(|(i, oid)| (oid.clone(), i))
                .collect::<HashMap<_, _>>();

            assert_eq!(position.len(), order.len(), "a commit was yielded twice");
            assert_eq!(order.first(), Some(&start));
            assert_eq!(
                order.iter().cloned().collect::<HashSet<_>>(),
                reachable(&store, &start)
            );
            for oid in &order {
                for parent in store.load(oid).unwrap().parents {
                    assert!(position[oid] < position[&parent]);
                }
            }
        }
    }

    #[rstest]
    fn missing_parent_aborts_the_walk() {
        let mut store = InMemoryCommitStore::default();
        store.add_commit("b", &["ghost"]);

        let result = AncestorWalk::new(&create_oid("b"), |oid| store.load(oid));
        assert!(matches!(result, Err(RepoError::NotFound(_))));
    }
}
