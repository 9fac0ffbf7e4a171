use crate::fields::Event;
use crate::prelude::*;
use std::io::BufRead;

pub fn read_events<R: BufRead>(reader: R) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    for (index, line) in reader.split(b'\n').enumerate() {
        let line = line.context("Failed to read input")?;
        let line = match std::str::from_utf8(&line) {
            Ok(line) => line.trim(),
            Err(e) => {
                warn!("Skipping line {}: not valid UTF-8 ({e})", index + 1);
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Event>(line) {
            Ok(event) => events.push(event),
            Err(e) => warn!("Skipping line {}: not a JSON object ({e})", index + 1),
        }
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_blank_and_broken_lines() {
        let input = "{\"pid\": 1, \"path\": \"init\"}\n\n[1, 2]\nnot json\n  {\"pid\": \"2\"}  \n";
        let events = read_events(input.as_bytes()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["path"], "init");
        assert_eq!(events[1]["pid"], "2");
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        let mut input = b"{\"pid\": 1}\n{\"pid\": \"".to_vec();
        input.extend_from_slice(&[0xff, 0xfe]);
        input.extend_from_slice(b"\"}\r\n{\"pid\": 3}");
        let events = read_events(input.as_slice()).unwrap();
        let pids: Vec<&serde_json::Value> = events.iter().map(|event| &event["pid"]).collect();
        assert_eq!(pids, vec![1, 3]);
    }

    #[test]
    fn test_keeps_field_order() {
        let events = read_events("{\"z\": 1, \"a\": 2}".as_bytes()).unwrap();
        let keys: Vec<&str> = events[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
