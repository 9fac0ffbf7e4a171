use crate::output::OutputFormat;
use proctree::{LineLayout, RenderMode};
use serde::{Deserialize, Serialize};

/// Configuration from a ptree.yaml file
///
/// Every value is a default: command-line flags always take precedence.
#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct PtreeConfig {
    /// Names of the event fields
    pub fields: Option<FieldsConfig>,
    pub options: Option<OptionsConfig>,
}

#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct FieldsConfig {
    pub pid_field: Option<String>,
    pub ppid_field: Option<String>,
    pub path_field: Option<String>,
    pub cmd_field: Option<String>,
    pub time_field: Option<String>,
    pub time_format: Option<String>,
    pub ppath_field: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct OptionsConfig {
    pub mode: Option<RenderMode>,
    /// Maximum command-line length. Accepts a number or its text, empty meaning no limit.
    pub truncate_cmd: Option<TruncateSetting>,
    pub layout: Option<LineLayout>,
    pub suppress_unknown_ancestors: Option<bool>,
    pub start_from_root: Option<bool>,
    pub output: Option<OutputFormat>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum TruncateSetting {
    Count(usize),
    Text(String),
}
