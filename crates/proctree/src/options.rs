use serde::{Deserialize, Serialize};

/// Shape of the rendered output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// One text line per process, with box-drawing connectors
    #[default]
    Tree,
    /// One annotated row per process
    Table,
}

/// Content of a rendered line, after the connectors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineLayout {
    /// `path cmd`
    #[default]
    Compact,
    /// Fixed-width `pid path time cmd` columns
    Columns,
}

/// Already-validated options of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeOptions {
    /// Absent for forest mode, present for a single tree around this pid
    pub root_pid: Option<String>,
    /// Expected path of `root_pid`. Only reported, never used to build the tree.
    pub root_path: Option<String>,
    pub mode: RenderMode,
    /// Maximum rendered length of command lines, 0 for no limit
    pub truncate_cmd: usize,
    pub layout: LineLayout,
    /// Hide the synthetic parents standing in for processes without events
    pub suppress_unknown_ancestors: bool,
    /// In targeted mode, start at the top-most known ancestor instead of the target
    pub start_from_root: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            root_pid: None,
            root_path: None,
            mode: RenderMode::Tree,
            truncate_cmd: 0,
            layout: LineLayout::Compact,
            suppress_unknown_ancestors: false,
            start_from_root: true,
        }
    }
}

impl TreeOptions {
    /// Options for a single tree around `pid`
    pub fn targeted(pid: impl Into<String>) -> Self {
        Self {
            root_pid: Some(pid.into()),
            ..Default::default()
        }
    }

    pub fn is_forest(&self) -> bool {
        self.root_pid.is_none()
    }
}
