//! Ancestry queries over the commit graph
//!
//! History is a DAG, so ancestry is a partial order: two commits can be equal,
//! one can be an ancestor of the other, or neither can reach the other
//! (incomparable). Nothing here assumes a total order.
//!
//! ## Merge base
//!
//! The best common ancestor is found in two phases:
//!
//! ### Phase 1: Find all common ancestors
//!
//! A bidirectional traversal explores both histories at once, newest commits
//! first. Commits reached from both sides are common ancestors; everything
//! below a common ancestor is marked STALE so the walk does not descend
//! further than it needs to.
//!
//! ### Phase 2: Drop redundant ancestors
//!
//! > A best common ancestor of X and Y is a common ancestor of X and Y that is
//! > not an ancestor of any other common ancestor.
//!
//! When several best ancestors remain (criss-cross histories), the most recent
//! one wins, ties broken by the smaller ID, so the answer is deterministic.

use crate::artifacts::objects::commit::SlimCommit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;
use bitflags::bitflags;
use std::cell::RefCell;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::fmt;

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Hash)]
    struct VisitState: u8 {
        const NONE = 0b00;
        const VISITED_FROM_SOURCE = 0b01;
        const VISITED_FROM_TARGET = 0b10;
        const VISITED_FROM_BOTH = Self::VISITED_FROM_SOURCE.bits() | Self::VISITED_FROM_TARGET.bits();
        const STALE = 0b100;
        const RESULT = 0b1000;
    }
}

impl fmt::Debug for VisitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut flags = Vec::new();
        if self.contains(VisitState::VISITED_FROM_SOURCE) {
            flags.push("SOURCE");
        }
        if self.contains(VisitState::VISITED_FROM_TARGET) {
            flags.push("TARGET");
        }
        if self.contains(VisitState::STALE) {
            flags.push("STALE");
        }
        if self.contains(VisitState::RESULT) {
            flags.push("RESULT");
        }
        if flags.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", flags.join("|"))
        }
    }
}

/// How two commits relate in history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ancestry {
    Same,
    /// The first commit is a proper ancestor of the second
    Ancestor,
    /// The first commit is a proper descendant of the second
    Descendant,
    Incomparable,
}

/// Answers ancestry questions using a commit loader
///
/// The loader maps a commit ID to its parents and timestamp, so the finder
/// works the same over the object database and over in-memory test graphs.
/// Loaded commits are cached for the lifetime of the finder.
pub struct AncestryFinder<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> Result<SlimCommit>,
{
    commit_loader: CommitLoaderFn,
    cache: RefCell<HashMap<ObjectId, SlimCommit>>,
}

impl<CommitLoaderFn> AncestryFinder<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> Result<SlimCommit>,
{
    pub fn new(commit_loader: CommitLoaderFn) -> Self {
        Self {
            commit_loader,
            cache: RefCell::new(HashMap::new()),
        }
    }

    fn load(&self, commit_id: &ObjectId) -> Result<SlimCommit> {
        if let Some(commit) = self.cache.borrow().get(commit_id) {
            return Ok(commit.clone());
        }

        let commit = (self.commit_loader)(commit_id)?;
        self.cache
            .borrow_mut()
            .insert(commit_id.clone(), commit.clone());

        Ok(commit)
    }

    /// Whether `ancestor` is reachable from `commit` through parent edges
    ///
    /// Every commit is an ancestor of itself.
    pub fn is_ancestor(&self, ancestor: &ObjectId, commit: &ObjectId) -> Result<bool> {
        if ancestor == commit {
            return Ok(true);
        }

        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([commit.clone()]);

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }

            for parent in self.load(&current)?.parents {
                if &parent == ancestor {
                    return Ok(true);
                }
                queue.push_back(parent);
            }
        }

        Ok(false)
    }

    pub fn compare(&self, first: &ObjectId, second: &ObjectId) -> Result<Ancestry> {
        if first == second {
            Ok(Ancestry::Same)
        } else if self.is_ancestor(first, second)? {
            Ok(Ancestry::Ancestor)
        } else if self.is_ancestor(second, first)? {
            Ok(Ancestry::Descendant)
        } else {
            Ok(Ancestry::Incomparable)
        }
    }

    /// Find the best common ancestor of two commits
    ///
    /// `None` when the histories share no commit.
    pub fn merge_base(
        &self,
        source_commit_id: &ObjectId,
        target_commit_id: &ObjectId,
    ) -> Result<Option<ObjectId>> {
        let common_ancestors = self
            .find_common_ancestors(source_commit_id, target_commit_id)?
            .into_keys()
            .collect::<HashSet<_>>();

        if common_ancestors.is_empty() {
            return Ok(None);
        }

        let mut redundant_ancestors = HashSet::<ObjectId>::new();
        for commit in &common_ancestors {
            for other in &common_ancestors {
                if other != commit
                    && !redundant_ancestors.contains(other)
                    && self.is_ancestor(commit, other)?
                {
                    redundant_ancestors.insert(commit.clone());
                    break;
                }
            }
        }

        let mut best_common_ancestors = Vec::new();
        for commit in common_ancestors {
            if !redundant_ancestors.contains(&commit) {
                let timestamp = self.load(&commit)?.timestamp;
                best_common_ancestors.push((timestamp, commit));
            }
        }
        tracing::debug!(
            candidates = best_common_ancestors.len(),
            "best common ancestors found"
        );

        // latest first, then smallest ID
        best_common_ancestors.sort_by(|(a_time, a_oid), (b_time, b_oid)| {
            b_time.cmp(a_time).then_with(|| a_oid.cmp(b_oid))
        });

        Ok(best_common_ancestors.into_iter().next().map(|(_, oid)| oid))
    }

    fn find_common_ancestors(
        &self,
        source_commit_id: &ObjectId,
        target_commit_id: &ObjectId,
    ) -> Result<HashMap<ObjectId, VisitState>> {
        if source_commit_id == target_commit_id {
            return Ok(HashMap::from([(
                source_commit_id.clone(),
                VisitState::RESULT,
            )]));
        }

        let mut ancestors_states = HashMap::<ObjectId, VisitState>::new();
        let mut priority_queue = BinaryHeap::new();

        // newest commits are processed first (max heap keyed on timestamp)
        for (commit_id, state) in [
            (source_commit_id, VisitState::VISITED_FROM_SOURCE),
            (target_commit_id, VisitState::VISITED_FROM_TARGET),
        ] {
            let commit = self.load(commit_id)?;
            ancestors_states.insert(commit.oid.clone(), state);
            priority_queue.push((commit.timestamp, commit.oid));
        }

        while let Some((_, commit_id)) = priority_queue.pop() {
            let current_state = ancestors_states
                .get(&commit_id)
                .copied()
                .unwrap_or(VisitState::NONE);

            if current_state.contains(VisitState::STALE) {
                continue;
            }

            let is_common_ancestor = current_state.contains(VisitState::VISITED_FROM_BOTH);
            if is_common_ancestor {
                ancestors_states
                    .entry(commit_id.clone())
                    .and_modify(|state| *state |= VisitState::RESULT);
            }

            for parent_id in self.load(&commit_id)?.parents {
                let parent_state = ancestors_states
                    .get(&parent_id)
                    .copied()
                    .unwrap_or(VisitState::NONE);

                // parents inherit the visit sides, never the RESULT mark
                let mut inherited = current_state.difference(VisitState::RESULT);
                if is_common_ancestor {
                    inherited |= VisitState::STALE;
                }

                let new_state = parent_state | inherited;
                if new_state != parent_state {
                    let parent_commit = self.load(&parent_id)?;
                    ancestors_states.insert(parent_id.clone(), new_state);
                    priority_queue.push((parent_commit.timestamp, parent_id));
                }
            }
        }

        tracing::trace!(states = ?ancestors_states, "common ancestor walk finished");

        Ok(ancestors_states
            .into_iter()
            .filter(|(_, state)| {
                !state.contains(VisitState::STALE) && state.contains(VisitState::RESULT)
            })
            .collect())
    }
}
