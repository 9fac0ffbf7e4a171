use crate::time::parse_time;
use proctree::RawRecord;
use serde_json::{Map, Value};

/// One input event, keyed by its original field names
pub type Event = Map<String, Value>;

/// Names of the event fields holding each process attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub pid_field: String,
    pub ppid_field: String,
    pub path_field: String,
    pub cmd_field: String,
    /// Creation time field (epoch seconds or text)
    pub time_field: Option<String>,
    /// `strftime`-style format of the time field
    pub time_format: Option<String>,
    /// Parent path hint, used when the parent's own event is missing
    pub ppath_field: Option<String>,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            pid_field: "pid".to_string(),
            ppid_field: "ppid".to_string(),
            path_field: "path".to_string(),
            cmd_field: "cmd".to_string(),
            time_field: None,
            time_format: None,
            ppath_field: None,
        }
    }
}

/// Text form of an event value: strings as-is, null as empty
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl FieldMapping {
    fn text(event: &Event, field: &str) -> String {
        event.get(field).map(value_to_string).unwrap_or_default()
    }

    /// Read the process attributes of one event
    pub fn map_event(&self, event: &Event) -> RawRecord {
        let mut record = RawRecord::new(
            Self::text(event, &self.pid_field),
            Self::text(event, &self.ppid_field),
            Self::text(event, &self.path_field),
            Self::text(event, &self.cmd_field),
        );

        if let Some(time_field) = &self.time_field {
            let raw_time = Self::text(event, time_field);
            if let Some(parsed) = parse_time(&raw_time, self.time_format.as_deref()) {
                record.time = parsed.time;
                record.time_display = Some(parsed.display);
            }
        }
        if let Some(ppath_field) = &self.ppath_field {
            let hint = Self::text(event, ppath_field);
            if !hint.trim().is_empty() {
                record = record.with_ppath_hint(hint);
            }
        }
        record
    }
}
