use crate::prelude::*;
use proctree::{Output, Rendered, TableRow};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tabled::settings::object::Rows;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tree lines, or a table in table mode
    #[default]
    Text,
    /// A single tree event, or one JSON object per row in table mode
    Json,
}

/// The event emitted for a whole tree in JSON output
#[derive(Debug, Serialize)]
struct TreeEvent<'a> {
    tree: String,
    target_pid: &'a str,
    target_path: &'a str,
}

#[derive(Tabled)]
struct DisplayRow<'a> {
    #[tabled(rename = "PID")]
    pid: &'a str,
    #[tabled(rename = "PPID")]
    ppid: &'a str,
    #[tabled(rename = "Depth")]
    depth: usize,
    #[tabled(rename = "Root")]
    is_root: bool,
    #[tabled(rename = "Time")]
    time: &'a str,
    #[tabled(rename = "Tree")]
    line: &'a str,
}

fn build_table(rows: &[TableRow]) -> String {
    let display_rows: Vec<DisplayRow> = rows
        .iter()
        .map(|row| DisplayRow {
            pid: &row.pid,
            ppid: &row.ppid,
            depth: row.depth,
            is_root: row.is_root,
            time: &row.time,
            line: &row.line,
        })
        .collect();

    let mut table = Table::new(display_rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

/// Write the rendered output of one invocation
pub fn write_output<W: Write>(out: &mut W, output: &Output, format: OutputFormat) -> Result<()> {
    match (format, &output.rendered) {
        (OutputFormat::Text, Rendered::Lines(lines)) => {
            for line in lines {
                writeln!(out, "{line}")?;
            }
        }
        (OutputFormat::Text, Rendered::Rows(rows)) => {
            if !rows.is_empty() {
                writeln!(out, "{}", build_table(rows))?;
            }
        }
        (OutputFormat::Json, Rendered::Lines(lines)) => {
            let event = TreeEvent {
                tree: lines.join("\n"),
                target_pid: output.target.as_ref().map_or("", |t| t.pid.as_str()),
                target_path: output.target.as_ref().map_or("", |t| t.path.as_str()),
            };
            writeln!(out, "{}", serde_json::to_string(&event)?)?;
        }
        (OutputFormat::Json, Rendered::Rows(rows)) => {
            for row in rows {
                writeln!(out, "{}", serde_json::to_string(row)?)?;
            }
        }
    }
    out.flush().context("Failed to write output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use proctree::{RawRecord, RenderMode, TreeOptions, render_events};

    fn records() -> Vec<RawRecord> {
        vec![
            RawRecord::new("1", "", "init", ""),
            RawRecord::new("2", "1", "bash", "-l"),
        ]
    }

    fn written(output: &Output, format: OutputFormat) -> String {
        let mut buffer = Vec::new();
        write_output(&mut buffer, output, format).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_text_lines() {
        let output = render_events(records(), &TreeOptions::default()).unwrap();
        assert_snapshot!(written(&output, OutputFormat::Text).trim_end(), @r"
        init
        └── bash -l
        ");
    }

    #[test]
    fn test_json_tree_event() {
        let output = render_events(records(), &TreeOptions::targeted("2")).unwrap();
        assert_snapshot!(
            written(&output, OutputFormat::Json).trim_end(),
            @r#"{"tree":"init\n└── bash -l","target_pid":"2","target_path":"bash"}"#
        );

        let output = render_events(records(), &TreeOptions::default()).unwrap();
        let event: serde_json::Value =
            serde_json::from_str(&written(&output, OutputFormat::Json)).unwrap();
        assert_eq!(event["target_pid"], "");
        assert_eq!(event["target_path"], "");
    }

    #[test]
    fn test_table_modes() {
        let options = TreeOptions {
            mode: RenderMode::Table,
            ..Default::default()
        };
        let output = render_events(records(), &options).unwrap();

        let json = written(&output, OutputFormat::Json);
        let rows: Vec<serde_json::Value> = json
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["line"], "└── bash -l");
        assert_eq!(rows[1]["is_root"], "false");

        let table = written(&output, OutputFormat::Text);
        let lines: Vec<&str> = table.lines().collect();
        // Borders, header and one line per row
        assert_eq!(lines.len(), 6);
        assert!(lines[1].contains("PID") && lines[1].contains("Tree"));
        assert!(lines[4].contains("└── bash -l"));
        assert!(lines[4].contains("false"));
    }
}
