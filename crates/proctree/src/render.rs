//! Pre-order rendering of a [`Forest`] into tree lines or table rows.

use crate::forest::{Forest, NodeKind, TreeNode};
use crate::options::{LineLayout, RenderMode, TreeOptions};
use itertools::Itertools;
use serde::{Serialize, Serializer};

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

const ELLIPSIS: char = '…';
/// Time column value of placeholder rows
pub const UNKNOWN_TIME: &str = "[unknown]";

const PID_WIDTH: usize = 6;
const PATH_WIDTH: usize = 50;
const TIME_WIDTH: usize = 23;

/// One process of a forest, flattened with its tree annotations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    /// Same text as the tree-mode line, connectors included
    pub line: String,
    pub tree_prefix: String,
    pub pid: String,
    pub ppid: String,
    pub path: String,
    pub cmd: String,
    pub time: String,
    pub depth: usize,
    #[serde(serialize_with = "serialize_flag")]
    pub is_root: bool,
}

fn serialize_flag<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *flag { "true" } else { "false" })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Lines(Vec<String>),
    Rows(Vec<TableRow>),
}

impl Rendered {
    /// Tree lines, whatever the mode
    pub fn lines(&self) -> Vec<&str> {
        match self {
            Rendered::Lines(lines) => lines.iter().map(String::as_str).collect(),
            Rendered::Rows(rows) => rows.iter().map(|row| row.line.as_str()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Rendered::Lines(lines) => lines.len(),
            Rendered::Rows(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Replace line breaks and tabs with spaces and collapse whitespace runs
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().join(" ")
}

/// Keep at most `limit` characters, marking the cut with an ellipsis. 0 disables the limit.
pub fn truncate(text: &str, limit: usize) -> String {
    if limit == 0 || text.chars().count() <= limit {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(limit).collect();
    truncated.push(ELLIPSIS);
    truncated
}

fn cut(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

/// Depth-first pre-order walk over every tree of a forest, yielding each node with its
/// connector prefix
struct Walk<'t, 'a> {
    stack: Vec<(&'t TreeNode<'a>, String, String)>,
}

impl<'t, 'a> Walk<'t, 'a> {
    fn new(forest: &'t Forest<'a>) -> Self {
        let stack = forest
            .roots
            .iter()
            .rev()
            .map(|root| (root, String::new(), String::new()))
            .collect();
        Self { stack }
    }
}

impl<'t, 'a> Iterator for Walk<'t, 'a> {
    type Item = (&'t TreeNode<'a>, String);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, prefix, carry) = self.stack.pop()?;
        let last = node.children.len().saturating_sub(1);
        for (at, child) in node.children.iter().enumerate().rev() {
            let (connector, extension) = if at == last {
                (LAST_BRANCH, SPACE)
            } else {
                (BRANCH, PIPE)
            };
            self.stack.push((
                child,
                format!("{carry}{connector}"),
                format!("{carry}{extension}"),
            ));
        }
        Some((node, prefix))
    }
}

/// Display fields of a node, cleaned and truncated
struct Fields {
    pid: String,
    ppid: String,
    path: String,
    cmd: String,
    time: String,
}

impl Fields {
    fn of(node: &TreeNode<'_>, truncate_cmd: usize) -> Self {
        match &node.kind {
            NodeKind::Process(record) => Self {
                pid: record.pid.to_string(),
                ppid: record
                    .ppid
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                path: clean_text(&record.path),
                cmd: truncate(&clean_text(&record.cmd), truncate_cmd),
                time: record.time_display.clone(),
            },
            NodeKind::Placeholder { pid, label } => Self {
                pid: pid.to_string(),
                ppid: String::new(),
                path: clean_text(label),
                cmd: String::new(),
                time: UNKNOWN_TIME.to_string(),
            },
        }
    }

    fn content(&self, layout: LineLayout) -> String {
        match layout {
            LineLayout::Compact if self.cmd.is_empty() => self.path.clone(),
            LineLayout::Compact => format!("{} {}", self.path, self.cmd),
            LineLayout::Columns => format!(
                "{:<pid_w$} {:<path_w$} {:<time_w$} {}",
                self.pid,
                cut(&self.path, PATH_WIDTH),
                cut(&self.time, TIME_WIDTH),
                self.cmd,
                pid_w = PID_WIDTH,
                path_w = PATH_WIDTH,
                time_w = TIME_WIDTH,
            )
            .trim_end()
            .to_string(),
        }
    }
}

fn line_of(node: &TreeNode<'_>, prefix: &str, fields: &Fields, layout: LineLayout) -> String {
    let mut line = format!("{prefix}{}", fields.content(layout));
    if let Some(ppid) = &node.cycle_cut {
        line.push_str(&format!(" [cycle: parent {ppid}]"));
    }
    line
}

/// One line per node, in pre-order
pub fn render_lines(forest: &Forest<'_>, options: &TreeOptions) -> Vec<String> {
    Walk::new(forest)
        .map(|(node, prefix)| {
            let fields = Fields::of(node, options.truncate_cmd);
            line_of(node, &prefix, &fields, options.layout)
        })
        .collect()
}

/// One row per node, in pre-order
pub fn render_rows(forest: &Forest<'_>, options: &TreeOptions) -> Vec<TableRow> {
    Walk::new(forest)
        .map(|(node, prefix)| {
            let fields = Fields::of(node, options.truncate_cmd);
            let line = line_of(node, &prefix, &fields, options.layout);
            TableRow {
                line,
                tree_prefix: prefix,
                pid: fields.pid,
                ppid: fields.ppid,
                path: fields.path,
                cmd: fields.cmd,
                time: fields.time,
                depth: node.depth,
                is_root: node.is_root,
            }
        })
        .collect()
}

pub fn render(forest: &Forest<'_>, options: &TreeOptions) -> Rendered {
    match options.mode {
        RenderMode::Tree => Rendered::Lines(render_lines(forest, options)),
        RenderMode::Table => Rendered::Rows(render_rows(forest, options)),
    }
}
