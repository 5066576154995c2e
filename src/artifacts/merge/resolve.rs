//! Three-way reconciliation
//!
//! Given the changes each side made relative to the merge base, decide per path
//! which outcome the merged tree gets:
//!
//! - changed only by us: keep ours
//! - changed only by them: take theirs
//! - changed by both to the same entry: take it
//! - changed by both differently: conflict
//!
//! A file accepted from one side at a path that the other side uses as a directory
//! is a conflict too; it is reported at the file path and at every path the other
//! side placed underneath it.

use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::diff::tree_diff::PathChange;
use crate::artifacts::merge::conflict::Conflict;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Ours,
    Theirs,
    Both,
}

#[derive(Debug, Clone)]
struct Accepted {
    side: Side,
    base: Option<DatabaseEntry>,
    entry: Option<DatabaseEntry>,
}

/// Outcome of reconciling two change lists against their common base
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Path to merged entry, `None` meaning the path is removed
    pub accepted: BTreeMap<PathBuf, Option<DatabaseEntry>>,
    /// Ordered by path bytes
    pub conflicts: Vec<Conflict>,
}

impl Reconciliation {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn accepted_list(&self) -> Vec<(PathBuf, Option<DatabaseEntry>)> {
        self.accepted
            .iter()
            .map(|(path, entry)| (path.clone(), entry.clone()))
            .collect()
    }
}

pub fn reconcile(ours: &[PathChange], theirs: &[PathChange]) -> Reconciliation {
    let ours = ours
        .iter()
        .map(|change| (change.path.clone(), change))
        .collect::<BTreeMap<_, _>>();
    let theirs = theirs
        .iter()
        .map(|change| (change.path.clone(), change))
        .collect::<BTreeMap<_, _>>();

    let mut accepted = BTreeMap::<PathBuf, Accepted>::new();
    let mut conflicts = Vec::new();

    for (path, change) in &ours {
        match theirs.get(path) {
            None => {
                accepted.insert(
                    path.clone(),
                    Accepted {
                        side: Side::Ours,
                        base: change.old.clone(),
                        entry: change.new.clone(),
                    },
                );
            }
            Some(their_change) if their_change.new == change.new => {
                accepted.insert(
                    path.clone(),
                    Accepted {
                        side: Side::Both,
                        base: change.old.clone(),
                        entry: change.new.clone(),
                    },
                );
            }
            Some(their_change) => {
                trace!(path = %path.display(), "both sides changed the path differently");
                conflicts.push(Conflict::new(
                    path.clone(),
                    change.old.clone(),
                    change.new.clone(),
                    their_change.new.clone(),
                ));
            }
        }
    }

    for (path, change) in &theirs {
        if !ours.contains_key(path) {
            accepted.insert(
                path.clone(),
                Accepted {
                    side: Side::Theirs,
                    base: change.old.clone(),
                    entry: change.new.clone(),
                },
            );
        }
    }

    conflicts.extend(split_file_directory_clashes(&mut accepted));
    conflicts.sort_by(|a, b| {
        a.path
            .as_os_str()
            .as_encoded_bytes()
            .cmp(b.path.as_os_str().as_encoded_bytes())
    });

    Reconciliation {
        accepted: accepted
            .into_iter()
            .map(|(path, accepted)| (path, accepted.entry))
            .collect(),
        conflicts,
    }
}

/// Move file-versus-directory clashes out of `accepted` and into conflicts
fn split_file_directory_clashes(accepted: &mut BTreeMap<PathBuf, Accepted>) -> Vec<Conflict> {
    let mut clashing = Vec::<PathBuf>::new();

    for (path, file) in accepted.iter() {
        if file.entry.is_none() || file.side == Side::Both {
            continue;
        }

        let nested = accepted
            .iter()
            .filter(|(other_path, other)| {
                is_strictly_under(other_path, path)
                    && other.side != Side::Both
                    && other.side != file.side
            })
            .map(|(other_path, _)| other_path.clone())
            .collect::<Vec<_>>();

        if !nested.is_empty() {
            clashing.push(path.clone());
            clashing.extend(nested);
        }
    }

    clashing.sort();
    clashing.dedup();

    clashing
        .into_iter()
        .filter_map(|path| {
            let accepted = accepted.remove(&path)?;
            let (ours, theirs) = match accepted.side {
                Side::Ours => (accepted.entry, accepted.base.clone()),
                _ => (accepted.base.clone(), accepted.entry),
            };
            Some(Conflict::new(path, accepted.base, ours, theirs))
        })
        .collect()
}

fn is_strictly_under(path: &Path, ancestor: &Path) -> bool {
    path != ancestor && path.starts_with(ancestor)
}
