//! Deterministic choice among start-eligible tasks.

use std::cmp::Reverse;

use crate::core::task::TaskId;

/// How a task competes for activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank {
    /// Higher wins.
    Priority(u32),
    /// Chosen only when no prioritized task is eligible; preemptible by any.
    Fallback,
}

impl Rank {
    pub fn is_fallback(self) -> bool {
        matches!(self, Rank::Fallback)
    }
}

/// A start-eligible task offered to [`select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub id: TaskId,
    pub name: &'a str,
    pub rank: Rank,
}

/// Pick the winner among eligible candidates.
///
/// Order: any prioritized task before the fallback, higher priority first,
/// then lexicographically smaller name. Registration order never matters.
pub fn select<'c, 'a>(eligible: &'c [Candidate<'a>]) -> Option<&'c Candidate<'a>> {
    eligible.iter().min_by_key(|candidate| sort_key(candidate))
}

/// True if `challenger` may take control from a task ranked `active`.
pub fn preempts(active: Rank, challenger: Rank) -> bool {
    active.is_fallback() && !challenger.is_fallback()
}

fn sort_key<'a>(candidate: &Candidate<'a>) -> (bool, Reverse<u32>, &'a str, TaskId) {
    match candidate.rank {
        Rank::Priority(priority) => (false, Reverse(priority), candidate.name, candidate.id),
        Rank::Fallback => (true, Reverse(0), candidate.name, candidate.id),
    }
}
