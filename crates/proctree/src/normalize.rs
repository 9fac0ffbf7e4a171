use crate::record::{Pid, ProcessRecord, RawRecord};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// An input observation dropped during normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Position of the record in the input sequence
    pub index: usize,
    pub reason: String,
}

/// The canonical record set: one record per pid
#[derive(Debug, Default)]
pub struct Normalized {
    pub records: BTreeMap<Pid, ProcessRecord>,
    /// First parent-path hint seen for each parent pid
    pub parent_hints: BTreeMap<Pid, String>,
    pub skipped: Vec<SkippedRecord>,
}

impl Normalized {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Whether `candidate` should replace the `retained` observation of the same pid
fn supersedes(candidate: &ProcessRecord, retained: &ProcessRecord) -> bool {
    match (candidate.time, retained.time) {
        (Some(candidate), Some(retained)) => candidate < retained,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Collapse raw observations into one canonical record per pid.
///
/// The earliest timed observation wins; untimed observations only survive when no timed one
/// exists for that pid, in which case the first seen is kept.
pub fn normalize<I>(raw_records: I) -> Normalized
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut normalized = Normalized::default();
    let mut observed = 0usize;

    for (index, raw) in raw_records.into_iter().enumerate() {
        observed += 1;
        let raw_pid = raw.pid.clone();
        let Some(record) = ProcessRecord::from_raw(raw) else {
            warn!("Skipping record #{index}: unusable pid {raw_pid:?}");
            normalized.skipped.push(SkippedRecord {
                index,
                reason: format!("unusable pid {raw_pid:?}"),
            });
            continue;
        };

        if let (Some(ppid), Some(hint)) = (&record.ppid, &record.ppath_hint) {
            normalized
                .parent_hints
                .entry(ppid.clone())
                .or_insert_with(|| hint.clone());
        }

        match normalized.records.entry(record.pid.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                if supersedes(&record, slot.get()) {
                    debug!("Replacing observation of pid {} with an earlier one", record.pid);
                    slot.insert(record);
                }
            }
        }
    }

    debug!(
        "Normalized {observed} observations into {} records ({} skipped)",
        normalized.records.len(),
        normalized.skipped.len()
    );
    normalized
}
