//! Termination guard for walks over possibly cyclic parent links.
//!
//! Every loop that follows `ppid` links or descends into children goes through a
//! [`CycleGuard`]: it remembers which pids were already entered and refuses to take more steps
//! than there are records, which is the longest chain an acyclic input can produce.

use crate::record::Pid;
use std::collections::HashSet;

/// Outcome of entering a pid during a guarded walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// First time this pid is entered
    Fresh,
    /// The pid was already entered: the walk closed a cycle here
    Reentered,
    /// The step budget is spent
    Exhausted,
}

#[derive(Debug)]
pub struct CycleGuard<'a> {
    visited: HashSet<&'a Pid>,
    remaining: usize,
}

impl<'a> CycleGuard<'a> {
    /// Create a guard allowing at most `bound` fresh entries
    pub fn new(bound: usize) -> Self {
        Self {
            visited: HashSet::with_capacity(bound.min(1024)),
            remaining: bound,
        }
    }

    pub fn enter(&mut self, pid: &'a Pid) -> Step {
        if self.visited.contains(pid) {
            return Step::Reentered;
        }
        if self.remaining == 0 {
            return Step::Exhausted;
        }
        self.remaining -= 1;
        self.visited.insert(pid);
        Step::Fresh
    }

    pub fn contains(&self, pid: &Pid) -> bool {
        self.visited.contains(pid)
    }
}
