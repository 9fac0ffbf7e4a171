use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Parent id value meaning "this process has no parent"
pub const NO_PARENT: &str = "0";

/// Display format used when a timestamp comes without its own display text
pub const TIME_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A process identifier.
///
/// Identifiers are kept as text since event sources disagree on their shape, but they order
/// numerically whenever both sides are decimal so that `9` sorts before `10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pid(String);

impl Pid {
    /// Parse a pid from raw event text. Returns `None` for empty values or values with
    /// embedded whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// Parse a parent pid, mapping the "no parent" sentinels (empty, `0`) to `None`
    pub fn parse_parent(raw: &str) -> Option<Self> {
        Self::parse(raw).filter(|pid| pid.0 != NO_PARENT)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl Ord for Pid {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Pid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One process observation as delivered by the event source, after field mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub pid: String,
    pub ppid: String,
    pub path: String,
    pub cmd: String,
    /// Creation time, already parsed. `None` means the observation is unordered.
    pub time: Option<NaiveDateTime>,
    /// Text shown for the time. Falls back to the formatted `time`.
    pub time_display: Option<String>,
    /// Path of the parent process, useful when the parent's own event is missing
    pub ppath_hint: Option<String>,
}

impl RawRecord {
    pub fn new(
        pid: impl Into<String>,
        ppid: impl Into<String>,
        path: impl Into<String>,
        cmd: impl Into<String>,
    ) -> Self {
        Self {
            pid: pid.into(),
            ppid: ppid.into(),
            path: path.into(),
            cmd: cmd.into(),
            ..Default::default()
        }
    }

    pub fn with_time(mut self, time: NaiveDateTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_time_display(mut self, display: impl Into<String>) -> Self {
        self.time_display = Some(display.into());
        self
    }

    pub fn with_ppath_hint(mut self, hint: impl Into<String>) -> Self {
        self.ppath_hint = Some(hint.into());
        self
    }
}

/// The canonical observation kept for a pid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: Pid,
    pub ppid: Option<Pid>,
    pub path: String,
    pub cmd: String,
    pub time: Option<NaiveDateTime>,
    pub time_display: String,
    pub ppath_hint: Option<String>,
}

impl ProcessRecord {
    /// Build the canonical form of a raw record, or `None` if its pid is unusable
    pub(crate) fn from_raw(raw: RawRecord) -> Option<Self> {
        let pid = Pid::parse(&raw.pid)?;
        let time_display = match (raw.time_display, raw.time) {
            (Some(display), _) => display.trim().to_string(),
            (None, Some(time)) => time.format(TIME_DISPLAY_FORMAT).to_string(),
            (None, None) => String::new(),
        };

        Some(Self {
            pid,
            ppid: Pid::parse_parent(&raw.ppid),
            path: raw.path.trim().to_string(),
            cmd: raw.cmd.trim().to_string(),
            time: raw.time,
            time_display,
            ppath_hint: raw
                .ppath_hint
                .map(|hint| hint.trim().to_string())
                .filter(|hint| !hint.is_empty()),
        })
    }

    /// Whether this record is its own parent
    pub fn is_self_parented(&self) -> bool {
        self.ppid.as_ref() == Some(&self.pid)
    }
}

/// Order siblings: by time when every sibling has one (pid breaks ties), by pid otherwise
pub(crate) fn order_siblings<T>(
    siblings: &mut [T],
    key: impl Fn(&T) -> (Option<NaiveDateTime>, &Pid),
) {
    let all_timed = siblings.iter().all(|sibling| key(sibling).0.is_some());
    if all_timed {
        siblings.sort_by(|a, b| {
            let (time_a, pid_a) = key(a);
            let (time_b, pid_b) = key(b);
            time_a.cmp(&time_b).then_with(|| pid_a.cmp(pid_b))
        });
    } else {
        siblings.sort_by(|a, b| key(a).1.cmp(key(b).1));
    }
}
