use crate::fields::Event;
use crate::prelude::*;
use serde_json::Value;
use std::io::BufRead;

pub fn read_events<R: BufRead>(reader: R) -> Result<Vec<Event>> {
    let mut rdr = ::csv::ReaderBuilder::new()
        .flexible(true)
        .trim(::csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(ToString::to_string)
        .collect();

    let mut events = Vec::new();
    for (index, row) in rdr.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping CSV row {}: {e}", index + 1);
                continue;
            }
        };
        let event: Event = headers
            .iter()
            .zip(row.iter())
            .map(|(header, value)| (header.clone(), Value::String(value.to_string())))
            .collect();
        events.push(event);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_become_events() {
        let input = "pid, ppid ,path,cmd\n1,0,init,\n2,1,bash,\"bash -c \"\"ls, -l\"\"\"\n3,2\n";
        let events = read_events(input.as_bytes()).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0]["path"], "init");
        assert_eq!(events[1]["ppid"], "1");
        assert_eq!(events[1]["cmd"], "bash -c \"ls, -l\"");
        // Short rows only carry the fields they have
        assert_eq!(events[2].len(), 2);
    }

    #[test]
    fn test_invalid_utf8_row_is_skipped() {
        let mut input = b"pid,path\n1,init\n2,".to_vec();
        input.extend_from_slice(&[0xff, 0xfe]);
        input.extend_from_slice(b"\n3,sh\n");
        let events = read_events(input.as_slice()).unwrap();
        let pids: Vec<&Value> = events.iter().map(|event| &event["pid"]).collect();
        assert_eq!(pids, vec!["1", "3"]);
    }
}
