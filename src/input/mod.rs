//! Readers turning an input stream into [`Event`]s.

use crate::fields::Event;
use crate::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

mod csv;
mod jsonl;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// One JSON object per line
    Jsonl,
    /// Comma-separated values with a header row
    Csv,
}

impl InputFormat {
    /// Guess the format from a file extension, defaulting to JSON lines
    pub fn infer(path: Option<&Path>) -> Self {
        match path
            .and_then(|path| path.extension())
            .and_then(|extension| extension.to_str())
        {
            Some(extension) if extension.eq_ignore_ascii_case("csv") => InputFormat::Csv,
            _ => InputFormat::Jsonl,
        }
    }
}

/// Open `path`, or stdin when no path is given
pub fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Read every event of `reader`. Unreadable lines or rows are skipped with a warning.
pub fn read_events<R: BufRead>(reader: R, format: InputFormat) -> Result<Vec<Event>> {
    let events = match format {
        InputFormat::Jsonl => jsonl::read_events(reader)?,
        InputFormat::Csv => csv::read_events(reader)?,
    };
    debug!("Read {} events", events.len());
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_infer_format() {
        assert_eq!(InputFormat::infer(None), InputFormat::Jsonl);
        assert_eq!(
            InputFormat::infer(Some(&PathBuf::from("events.CSV"))),
            InputFormat::Csv
        );
        assert_eq!(
            InputFormat::infer(Some(&PathBuf::from("events.jsonl"))),
            InputFormat::Jsonl
        );
        assert_eq!(
            InputFormat::infer(Some(&PathBuf::from("events"))),
            InputFormat::Jsonl
        );
    }

    #[test]
    fn test_open_missing_file() {
        let error = open_input(Some(Path::new("/nonexistent/events.jsonl")))
            .err()
            .unwrap();
        assert!(error.to_string().contains("Failed to open input file"));
    }
}
