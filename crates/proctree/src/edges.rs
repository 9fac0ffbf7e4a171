use crate::guard::{CycleGuard, Step};
use crate::normalize::Normalized;
use crate::record::{Pid, ProcessRecord, order_siblings};
use log::debug;
use std::collections::BTreeMap;

/// How a record's parent link resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    /// No parent: empty or sentinel ppid
    Root,
    /// The parent is a known record and the chain above it terminates
    Linked,
    /// The ppid is set but no record exists for it
    UnknownAncestor,
    /// Following ppid links from this record comes back to it
    Cyclic,
}

/// Why an upward walk stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEnd<'a> {
    /// The last record of the chain has no parent
    NoParent,
    /// The last record of the chain points at this pid, which has no record
    UnknownParent(&'a Pid),
    /// The walk came back to this pid, already part of the chain
    Reentered(&'a Pid),
    /// More steps than records were needed
    Exhausted,
}

/// Result of following ppid links upward from a record
#[derive(Debug)]
pub struct AncestorWalk<'a> {
    /// Visited records, starting with the walk's origin
    pub chain: Vec<&'a ProcessRecord>,
    pub end: WalkEnd<'a>,
}

impl<'a> AncestorWalk<'a> {
    /// The top-most record reached by the walk
    pub fn top(&self) -> &'a ProcessRecord {
        self.chain[self.chain.len() - 1]
    }
}

/// Parent/child structure over the canonical records.
///
/// Built once from a [`Normalized`] set and never mutated afterwards.
#[derive(Debug)]
pub struct AdjacencyIndex {
    records: BTreeMap<Pid, ProcessRecord>,
    parent_hints: BTreeMap<Pid, String>,
    /// Map of parent PID to ordered list of child PIDs
    children: BTreeMap<Pid, Vec<Pid>>,
    linkage: BTreeMap<Pid, Linkage>,
    /// Map of each cyclic PID to the member chosen to stand at the top of its cycle
    cycle_representatives: BTreeMap<Pid, Pid>,
}

impl AdjacencyIndex {
    pub fn build(normalized: Normalized) -> Self {
        let Normalized {
            records,
            parent_hints,
            ..
        } = normalized;

        let mut index = Self {
            records,
            parent_hints,
            children: BTreeMap::new(),
            linkage: BTreeMap::new(),
            cycle_representatives: BTreeMap::new(),
        };
        index.register_children();
        index.classify();
        index.elect_cycle_representatives();
        index
    }

    fn register_children(&mut self) {
        for record in self.records.values() {
            let Some(ppid) = &record.ppid else {
                continue;
            };
            if ppid == &record.pid || !self.records.contains_key(ppid) {
                continue;
            }
            self.children
                .entry(ppid.clone())
                .or_default()
                .push(record.pid.clone());
        }

        let records = &self.records;
        for kids in self.children.values_mut() {
            order_siblings(kids, |pid| (records[pid].time, pid));
        }
    }

    fn classify(&mut self) {
        let mut linkage = BTreeMap::new();
        for (pid, record) in &self.records {
            let kind = match &record.ppid {
                None => Linkage::Root,
                Some(ppid) if !self.records.contains_key(ppid) => Linkage::UnknownAncestor,
                Some(_) => match self.walk_ancestors(pid).map(|walk| walk.end) {
                    Some(WalkEnd::Reentered(reentry)) if reentry == pid => Linkage::Cyclic,
                    _ => Linkage::Linked,
                },
            };
            linkage.insert(pid.clone(), kind);
        }

        debug!(
            "Linkage: {} root, {} linked, {} with unknown ancestor, {} cyclic",
            linkage.values().filter(|l| **l == Linkage::Root).count(),
            linkage.values().filter(|l| **l == Linkage::Linked).count(),
            linkage.values().filter(|l| **l == Linkage::UnknownAncestor).count(),
            linkage.values().filter(|l| **l == Linkage::Cyclic).count(),
        );
        self.linkage = linkage;
    }

    fn elect_cycle_representatives(&mut self) {
        let mut representatives = BTreeMap::new();
        for (pid, kind) in &self.linkage {
            if *kind != Linkage::Cyclic || representatives.contains_key(pid) {
                continue;
            }
            let Some(walk) = self.walk_ancestors(pid) else {
                continue;
            };

            // Starting on a cycle member, the chain is exactly the cycle
            let mut members = walk.chain;
            order_siblings(&mut members, |member| (member.time, &member.pid));
            let representative = members[0].pid.clone();
            debug!(
                "Cycle through {} records, cut above pid {representative}",
                members.len()
            );
            for member in members {
                representatives.insert(member.pid.clone(), representative.clone());
            }
        }
        self.cycle_representatives = representatives;
    }

    /// Follow ppid links upward from `start`, stopping at a record without parent, at an
    /// unknown parent, or on re-entry. Returns `None` if `start` has no record.
    pub fn walk_ancestors(&self, start: &Pid) -> Option<AncestorWalk<'_>> {
        let mut current = self.records.get(start)?;
        let mut guard = CycleGuard::new(self.records.len());
        let mut chain = Vec::new();

        loop {
            match guard.enter(&current.pid) {
                Step::Fresh => chain.push(current),
                Step::Reentered => {
                    return Some(AncestorWalk {
                        chain,
                        end: WalkEnd::Reentered(&current.pid),
                    });
                }
                Step::Exhausted => {
                    return Some(AncestorWalk {
                        chain,
                        end: WalkEnd::Exhausted,
                    });
                }
            }

            let end = match &current.ppid {
                None => WalkEnd::NoParent,
                Some(ppid) => match self.records.get(ppid) {
                    Some(parent) => {
                        current = parent;
                        continue;
                    }
                    None => WalkEnd::UnknownParent(ppid),
                },
            };
            return Some(AncestorWalk { chain, end });
        }
    }

    pub fn record(&self, pid: &Pid) -> Option<&ProcessRecord> {
        self.records.get(pid)
    }

    pub fn records(&self) -> impl Iterator<Item = &ProcessRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ordered children of `pid`
    pub fn children_of(&self, pid: &Pid) -> &[Pid] {
        self.children.get(pid).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn linkage(&self, pid: &Pid) -> Option<Linkage> {
        self.linkage.get(pid).copied()
    }

    /// The member standing at the top of the cycle `pid` belongs to
    pub fn cycle_representative(&self, pid: &Pid) -> Option<&Pid> {
        self.cycle_representatives.get(pid)
    }

    pub fn is_cycle_representative(&self, pid: &Pid) -> bool {
        self.cycle_representative(pid) == Some(pid)
    }

    pub fn parent_hint(&self, ppid: &Pid) -> Option<&str> {
        self.parent_hints.get(ppid).map(String::as_str)
    }
}
