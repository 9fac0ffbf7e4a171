//! Assembly of owned trees out of the adjacency index.
//!
//! Trees never share nodes and never hold back references: an edge that would close a cycle is
//! recorded as [`TreeNode::cycle_cut`] on the node whose parent link was dropped.

use crate::edges::{AdjacencyIndex, Linkage, WalkEnd};
use crate::error::{TreeError, TreeResult};
use crate::guard::{CycleGuard, Step};
use crate::options::TreeOptions;
use crate::record::{Pid, ProcessRecord, order_siblings};
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};

/// Label of a placeholder when no child carried a hint for the missing parent
pub const UNKNOWN_PARENT_LABEL: &str = "[parent not in events/time range]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind<'a> {
    Process(&'a ProcessRecord),
    /// Stand-in for a parent only known through its children's ppid
    Placeholder { pid: Pid, label: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode<'a> {
    pub kind: NodeKind<'a>,
    pub children: Vec<TreeNode<'a>>,
    /// 0 at each tree root
    pub depth: usize,
    pub is_root: bool,
    pub is_placeholder: bool,
    /// Parent pid of this node whose edge was cut because it closed a cycle
    pub cycle_cut: Option<Pid>,
}

impl<'a> TreeNode<'a> {
    fn process(record: &'a ProcessRecord, depth: usize, is_root: bool) -> Self {
        Self {
            kind: NodeKind::Process(record),
            children: Vec::new(),
            depth,
            is_root,
            is_placeholder: false,
            cycle_cut: None,
        }
    }

    fn placeholder(pid: Pid, label: String, children: Vec<TreeNode<'a>>) -> Self {
        Self {
            kind: NodeKind::Placeholder { pid, label },
            children,
            depth: 0,
            is_root: false,
            is_placeholder: true,
            cycle_cut: None,
        }
    }

    pub fn pid(&self) -> &Pid {
        match &self.kind {
            NodeKind::Process(record) => &record.pid,
            NodeKind::Placeholder { pid, .. } => pid,
        }
    }

    pub fn record(&self) -> Option<&'a ProcessRecord> {
        match self.kind {
            NodeKind::Process(record) => Some(record),
            NodeKind::Placeholder { .. } => None,
        }
    }

    /// Nodes of this subtree in depth-first pre-order
    pub fn pre_order(&self) -> PreOrder<'_, 'a> {
        PreOrder { stack: vec![self] }
    }
}

/// Depth-first pre-order iterator over a subtree
pub struct PreOrder<'t, 'a> {
    stack: Vec<&'t TreeNode<'a>>,
}

impl<'t, 'a> Iterator for PreOrder<'t, 'a> {
    type Item = &'t TreeNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Ordered root trees ready for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forest<'a> {
    pub roots: Vec<TreeNode<'a>>,
    /// The requested record in targeted mode
    pub target: Option<&'a ProcessRecord>,
}

impl<'a> Forest<'a> {
    /// Every node of every tree, in rendering order
    pub fn nodes(&self) -> impl Iterator<Item = &TreeNode<'a>> {
        self.roots.iter().flat_map(TreeNode::pre_order)
    }

    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }
}

/// The top of one forest tree before assembly
enum Head<'a> {
    Record(&'a ProcessRecord),
    Placeholder {
        pid: &'a Pid,
        members: Vec<&'a ProcessRecord>,
    },
}

impl<'a> Head<'a> {
    fn sort_key(&self) -> (Option<NaiveDateTime>, &Pid) {
        match self {
            Head::Record(record) => (record.time, &record.pid),
            Head::Placeholder { pid, .. } => (None, *pid),
        }
    }
}

/// One node waiting for its children during iterative assembly
struct Slot<'a> {
    record: &'a ProcessRecord,
    parent: Option<usize>,
    depth: usize,
}

pub struct ForestBuilder<'a> {
    index: &'a AdjacencyIndex,
    options: &'a TreeOptions,
}

impl<'a> ForestBuilder<'a> {
    pub fn new(index: &'a AdjacencyIndex, options: &'a TreeOptions) -> Self {
        Self { index, options }
    }

    pub fn build(&self) -> TreeResult<Forest<'a>> {
        match &self.options.root_pid {
            None => Ok(self.build_forest()),
            Some(root_pid) => self.build_targeted(root_pid),
        }
    }

    /// One tree per root, per cycle and per missing parent
    fn build_forest(&self) -> Forest<'a> {
        if self.options.root_path.is_some() {
            info!("root_path provided without root_pid; ignoring root_path in forest mode.");
        }

        let mut heads = Vec::new();
        let mut orphans: BTreeMap<&'a Pid, Vec<&'a ProcessRecord>> = BTreeMap::new();

        for record in self.index.records() {
            match self.index.linkage(&record.pid) {
                Some(Linkage::Root) => heads.push(Head::Record(record)),
                Some(Linkage::Cyclic) if self.index.is_cycle_representative(&record.pid) => {
                    heads.push(Head::Record(record))
                }
                Some(Linkage::UnknownAncestor) => match &record.ppid {
                    Some(ppid) if !self.options.suppress_unknown_ancestors => {
                        orphans.entry(ppid).or_default().push(record)
                    }
                    _ => heads.push(Head::Record(record)),
                },
                _ => {}
            }
        }

        for (pid, mut members) in orphans {
            order_siblings(&mut members, |member| (member.time, &member.pid));
            heads.push(Head::Placeholder { pid, members });
        }
        order_siblings(&mut heads, Head::sort_key);

        let roots: Vec<TreeNode<'a>> = heads.into_iter().map(|head| self.grow(head)).collect();
        debug!("Built forest of {} trees", roots.len());
        Forest {
            roots,
            target: None,
        }
    }

    /// A single tree around the requested pid
    fn build_targeted(&self, root_pid: &str) -> TreeResult<Forest<'a>> {
        let not_found = || TreeError::NotFound {
            pid: match root_pid.trim() {
                "" => "<empty>".to_string(),
                pid => pid.to_string(),
            },
        };
        let target_pid = Pid::parse(root_pid).ok_or_else(not_found)?;
        let target = self.index.record(&target_pid).ok_or_else(not_found)?;

        if let Some(expected) = &self.options.root_path {
            if expected.trim() != target.path {
                warn!(
                    "Target PID {} has path {:?}, expected {:?}",
                    target.pid, target.path, expected
                );
            }
        }

        if !self.options.start_from_root {
            return Ok(Forest {
                roots: vec![self.assemble(target, 0)],
                target: Some(target),
            });
        }

        let walk = self
            .index
            .walk_ancestors(&target.pid)
            .ok_or_else(not_found)?;
        let top = walk.top();
        let head = match walk.end {
            WalkEnd::NoParent | WalkEnd::Exhausted => Head::Record(top),
            WalkEnd::UnknownParent(ppid) if !self.options.suppress_unknown_ancestors => {
                Head::Placeholder {
                    pid: ppid,
                    members: vec![top],
                }
            }
            WalkEnd::UnknownParent(_) => Head::Record(top),
            WalkEnd::Reentered(member) => Head::Record(
                self.index
                    .cycle_representative(member)
                    .and_then(|representative| self.index.record(representative))
                    .unwrap_or(top),
            ),
        };

        Ok(Forest {
            roots: vec![self.grow(head)],
            target: Some(target),
        })
    }

    fn grow(&self, head: Head<'a>) -> TreeNode<'a> {
        match head {
            Head::Record(record) => self.assemble(record, 0),
            Head::Placeholder { pid, members } => {
                let label = self
                    .index
                    .parent_hint(pid)
                    .unwrap_or(UNKNOWN_PARENT_LABEL)
                    .to_string();
                let children = members
                    .into_iter()
                    .map(|member| self.assemble(member, 1))
                    .collect();
                TreeNode::placeholder(pid.clone(), label, children)
            }
        }
    }

    /// Build the subtree below `root` without recursion.
    ///
    /// Each record has a single parent, so the only node a descent can reach twice is `root`
    /// itself, through the parent edge that closes a cycle.
    fn assemble(&self, root: &'a ProcessRecord, depth: usize) -> TreeNode<'a> {
        let mut guard = CycleGuard::new(self.index.len());
        guard.enter(&root.pid);

        let mut slots = vec![Slot {
            record: root,
            parent: None,
            depth,
        }];
        let mut pending = vec![0usize];
        while let Some(at) = pending.pop() {
            let (record, child_depth) = (slots[at].record, slots[at].depth + 1);
            let pid = &record.pid;
            for child in self.index.children_of(pid) {
                let Some(child_record) = self.index.record(child) else {
                    continue;
                };
                match guard.enter(child) {
                    Step::Fresh => {
                        pending.push(slots.len());
                        slots.push(Slot {
                            record: child_record,
                            parent: Some(at),
                            depth: child_depth,
                        });
                    }
                    Step::Reentered => debug!("Cutting cycle edge {pid} -> {child}"),
                    Step::Exhausted => {
                        warn!("Stopped descending below pid {pid}: step budget exhausted");
                        break;
                    }
                }
            }
        }

        // Children always sit at higher indexes than their parent
        let mut children: HashMap<usize, Vec<TreeNode<'a>>> = HashMap::new();
        let mut assembled = None;
        for (at, slot) in slots.iter().enumerate().rev() {
            let mut node = TreeNode::process(slot.record, slot.depth, slot.parent.is_none());
            if let Some(mut kids) = children.remove(&at) {
                kids.reverse();
                node.children = kids;
            }
            match slot.parent {
                Some(parent) => children.entry(parent).or_default().push(node),
                None => assembled = Some(node),
            }
        }

        let mut tree = assembled.unwrap_or_else(|| TreeNode::process(root, depth, true));
        if let Some(ppid) = &root.ppid {
            if guard.contains(ppid) {
                tree.cycle_cut = Some(ppid.clone());
            }
        }
        tree
    }
}

/// Build the forest (or targeted tree) described by `options`
pub fn build_forest<'a>(
    index: &'a AdjacencyIndex,
    options: &'a TreeOptions,
) -> TreeResult<Forest<'a>> {
    ForestBuilder::new(index, options).build()
}
