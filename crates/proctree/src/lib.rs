//! Rebuild process trees out of flat process-event records.
//!
//! Records go through [`normalize`] (one canonical record per pid), then an
//! [`AdjacencyIndex`] resolves parent links, a [`Forest`] is assembled and finally rendered as
//! tree lines or table rows. [`render_events`] runs all the steps.

pub mod edges;
pub mod error;
pub mod forest;
pub mod guard;
pub mod normalize;
pub mod options;
pub mod record;
pub mod render;

pub use edges::{AdjacencyIndex, Linkage};
pub use error::{TreeError, TreeResult};
pub use forest::{Forest, NodeKind, TreeNode, build_forest};
pub use normalize::{Normalized, SkippedRecord, normalize};
pub use options::{LineLayout, RenderMode, TreeOptions};
pub use record::{Pid, ProcessRecord, RawRecord};
pub use render::{Rendered, TableRow};

/// The process a targeted invocation was asked about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub pid: String,
    pub path: String,
}

/// Result of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub rendered: Rendered,
    pub skipped: Vec<SkippedRecord>,
    /// Set in targeted mode
    pub target: Option<Target>,
}

/// Normalize `raw_records`, build the forest or targeted tree and render it
pub fn render_events<I>(raw_records: I, options: &TreeOptions) -> TreeResult<Output>
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut normalized = normalize(raw_records);
    let skipped = std::mem::take(&mut normalized.skipped);
    let index = AdjacencyIndex::build(normalized);
    let forest = build_forest(&index, options)?;

    Ok(Output {
        rendered: render::render(&forest, options),
        skipped,
        target: forest.target.map(|record| Target {
            pid: record.pid.to_string(),
            path: record.path.clone(),
        }),
    })
}
