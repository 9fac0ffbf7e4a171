use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{
    config::{PtreeConfig, merger::ConfigMerger, parse_truncate_arg},
    input::{InputFormat, open_input, read_events},
    local_logger::{PTREE_U8_COLOR_CODE, init_local_logger},
    output::{OutputFormat, write_output},
    prelude::*,
};
use clap::{
    Args, Parser,
    builder::{Styles, styling},
};
use proctree::{LineLayout, RenderMode};

fn create_styles() -> Styles {
    styling::Styles::styled()
        .header(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .usage(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .literal(styling::Ansi256Color(PTREE_U8_COLOR_CODE).on_default() | styling::Effects::BOLD)
        .placeholder(styling::AnsiColor::Cyan.on_default())
}

fn parse_mode(value: &str) -> std::result::Result<RenderMode, String> {
    match value.trim() {
        "tree" => Ok(RenderMode::Tree),
        "table" => Ok(RenderMode::Table),
        other => Err(format!("expected tree or table, got {other:?}")),
    }
}

fn parse_layout(value: &str) -> std::result::Result<LineLayout, String> {
    match value.trim() {
        "compact" => Ok(LineLayout::Compact),
        "columns" => Ok(LineLayout::Columns),
        other => Err(format!("expected compact or columns, got {other:?}")),
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Rebuild process trees from process creation events",
    styles = create_styles()
)]
pub struct Cli {
    /// Events file (JSON lines or CSV). Reads stdin when absent
    pub input: Option<PathBuf>,

    /// Format of the events, inferred from the file extension by default
    #[arg(long, value_enum, env = "PTREE_INPUT_FORMAT")]
    pub input_format: Option<InputFormat>,

    /// Path to a ptree.yaml configuration file.
    /// If not provided, ptree.yaml, ptree.yml, .ptree.yaml or .ptree.yml is looked up in the
    /// current directory
    #[arg(long, env = "PTREE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Process to build a single tree around. All trees are built when absent
    #[arg(long, env = "PTREE_ROOT_PID")]
    pub root_pid: Option<String>,

    /// Expected path of --root-pid, only used to warn about a mismatch
    #[arg(long, env = "PTREE_ROOT_PATH")]
    pub root_path: Option<String>,

    #[command(flatten)]
    pub fields: FieldArgs,

    #[command(flatten)]
    pub render: RenderArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FieldArgs {
    /// Field holding the process id [default: pid]
    #[arg(long, alias = "child-name")]
    pub pid_field: Option<String>,

    /// Field holding the parent process id [default: ppid]
    #[arg(long, alias = "parent-name")]
    pub ppid_field: Option<String>,

    /// Field holding the process path or name [default: path]
    #[arg(long, alias = "process-name")]
    pub path_field: Option<String>,

    /// Field holding the command line [default: cmd]
    #[arg(long, alias = "command-line-name")]
    pub cmd_field: Option<String>,

    /// Field holding the creation time (epoch seconds, RFC 3339, or --time-format)
    #[arg(long, alias = "create-time-name")]
    pub time_field: Option<String>,

    /// strftime-style format of the time field
    #[arg(long, alias = "create-time-name-format")]
    pub time_format: Option<String>,

    /// Field holding the parent's path, shown when the parent has no event
    #[arg(long)]
    pub ppath_field: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RenderArgs {
    /// Output shape: tree or table [default: tree]
    #[arg(long, value_parser = parse_mode, env = "PTREE_MODE")]
    pub mode: Option<RenderMode>,

    /// Maximum command-line length, 0 or empty for no limit
    #[arg(long, value_parser = parse_truncate_arg, env = "PTREE_TRUNCATE_CMD")]
    pub truncate_cmd: Option<usize>,

    /// Line layout: compact (path and command) or columns [default: compact]
    #[arg(long, value_parser = parse_layout)]
    pub layout: Option<LineLayout>,

    /// Hide the placeholders standing in for parents without events
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub suppress_unknown_ancestors: Option<bool>,

    /// With --root-pid, start at the top-most known ancestor [default: true]
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub start_from_root: Option<bool>,

    /// Output format [default: text]
    #[arg(long, value_enum, env = "PTREE_OUTPUT")]
    pub output: Option<OutputFormat>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_local_logger()?;

    let current_dir = std::env::current_dir().context("Failed to read the current directory")?;
    execute(cli, &current_dir, &mut std::io::stdout().lock())
}

/// Read events, build the requested trees and write them to `out`
pub fn execute<W: Write>(cli: Cli, current_dir: &Path, out: &mut W) -> Result<()> {
    let config = PtreeConfig::discover_and_load(cli.config.as_deref(), current_dir)?;

    let fields = ConfigMerger::merge_fields(
        &cli.fields,
        config.as_ref().and_then(|c| c.fields.as_ref()),
    );
    let (options, output_format) = ConfigMerger::merge_options(
        &cli.render,
        cli.root_pid.as_deref(),
        cli.root_path.as_deref(),
        config.as_ref().and_then(|c| c.options.as_ref()),
    )?;
    debug!("Field mapping: {fields:?}");
    debug!("Options: {options:?}");

    let input_format = cli
        .input_format
        .unwrap_or_else(|| InputFormat::infer(cli.input.as_deref()));
    let events = read_events(open_input(cli.input.as_deref())?, input_format)?;

    let records = events.iter().map(|event| fields.map_event(event));
    let output = proctree::render_events(records, &options)?;
    if !output.skipped.is_empty() {
        info!(
            "Skipped {} events without a usable {} value",
            output.skipped.len(),
            fields.pid_field
        );
    }

    write_output(out, &output, output_format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_back_compat_aliases() {
        let cli = Cli::try_parse_from([
            "ptree",
            "--child-name",
            "ProcessId",
            "--parent-name",
            "ParentProcessId",
            "--process-name",
            "Image",
            "--command-line-name",
            "CommandLine",
            "--create-time-name",
            "CreateTime",
            "--create-time-name-format",
            "%Y",
        ])
        .unwrap();
        assert_eq!(cli.fields.pid_field.as_deref(), Some("ProcessId"));
        assert_eq!(cli.fields.ppid_field.as_deref(), Some("ParentProcessId"));
        assert_eq!(cli.fields.path_field.as_deref(), Some("Image"));
        assert_eq!(cli.fields.cmd_field.as_deref(), Some("CommandLine"));
        assert_eq!(cli.fields.time_field.as_deref(), Some("CreateTime"));
        assert_eq!(cli.fields.time_format.as_deref(), Some("%Y"));
    }

    #[test]
    fn test_render_flags() {
        let cli = Cli::try_parse_from([
            "ptree",
            "events.csv",
            "--mode",
            "table",
            "--truncate-cmd",
            "",
            "--suppress-unknown-ancestors",
            "--start-from-root=false",
            "--layout",
            "columns",
        ])
        .unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("events.csv")));
        assert_eq!(cli.render.mode, Some(RenderMode::Table));
        assert_eq!(cli.render.truncate_cmd, Some(0));
        assert_eq!(cli.render.suppress_unknown_ancestors, Some(true));
        assert_eq!(cli.render.start_from_root, Some(false));
        assert_eq!(cli.render.layout, Some(LineLayout::Columns));
    }

    #[test]
    fn test_bool_flags_leave_the_input_path_alone() {
        let cli = Cli::try_parse_from([
            "ptree",
            "--suppress-unknown-ancestors",
            "--start-from-root",
            "events.jsonl",
        ])
        .unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("events.jsonl")));
        assert_eq!(cli.render.suppress_unknown_ancestors, Some(true));
        assert_eq!(cli.render.start_from_root, Some(true));

        let cli = Cli::try_parse_from([
            "ptree",
            "--suppress-unknown-ancestors=false",
            "events.jsonl",
        ])
        .unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("events.jsonl")));
        assert_eq!(cli.render.suppress_unknown_ancestors, Some(false));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Cli::try_parse_from(["ptree", "--mode", "graph"]).is_err());
        assert!(Cli::try_parse_from(["ptree", "--truncate-cmd", "-1"]).is_err());
        assert!(Cli::try_parse_from(["ptree", "--start-from-root=yes"]).is_err());
    }
}
