//! Todo document parsing.
//!
//! Two line shapes are recognized:
//!   ✔ Deploy service @started(24-01-02 10:00) @done(24-01-02 11:00) @lasted(1h0m0s)
//!   - [mydebit] Fix login timeout        (or "☐ ..." for the box glyph)
//!
//! Anything else is dropped without an error.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static COMPLETED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[✔✓]\s*(?P<rest>.*?)\s*$").expect("completed line regex"));

static INCOMPLETE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:-\s+|☐\s*)(?P<rest>.*?)\s*$").expect("incomplete line regex")
});

static ANNOTATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(?P<name>started|done|lasted)\((?P<value>[^)]*)\)").expect("annotation regex")
});

static PROJECT_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(?P<tag>[^\]]*)\]\s*(?P<rest>.*)$").expect("project tag regex")
});

/// Time tracking annotations of a completed entry, kept as written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInfo {
    pub started: Option<String>,
    pub done: Option<String>,
    pub lasted: Option<String>,
}

impl TimeInfo {
    pub fn is_empty(&self) -> bool {
        self.started.is_none() && self.done.is_none() && self.lasted.is_none()
    }

    /// Annotations in the fixed order started, done, lasted.
    pub fn annotations(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(s) = &self.started {
            out.push(format!("@started({s})"));
        }
        if let Some(d) = &self.done {
            out.push(format!("@done({d})"));
        }
        if let Some(l) = &self.lasted {
            out.push(format!("@lasted({l})"));
        }
        out
    }
}

/// One recognized input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoEntry {
    pub raw_line: String,
    /// Trimmed task text with the leading project tag removed. Never empty.
    pub task: String,
    pub project_identifier: Option<String>,
    pub is_completed: bool,
    /// Only set for completed entries carrying at least one annotation.
    pub time_info: Option<TimeInfo>,
}

impl TodoEntry {
    /// Build an incomplete entry directly from task text, e.g. for a one-off match.
    pub fn from_task(task: impl Into<String>, project_identifier: Option<String>) -> Self {
        let task = task.into();
        Self {
            raw_line: task.clone(),
            task,
            project_identifier,
            is_completed: false,
            time_info: None,
        }
    }
}

/// Parse a whole document, keeping input line order.
pub fn parse_todo(text: &str) -> Vec<TodoEntry> {
    text.lines().filter_map(parse_todo_line).collect()
}

/// Parse a single line. `None` for blank or unrecognized lines.
pub fn parse_todo_line(line: &str) -> Option<TodoEntry> {
    if line.trim().is_empty() {
        return None;
    }

    let (body, is_completed, time_info) = if let Some(caps) = COMPLETED_RE.captures(line) {
        let (body, time_info) = split_time_annotations(&caps["rest"]);
        (body, true, (!time_info.is_empty()).then_some(time_info))
    } else if let Some(caps) = INCOMPLETE_RE.captures(line) {
        (caps["rest"].trim().to_string(), false, None)
    } else {
        return None;
    };

    if body.is_empty() {
        return None;
    }

    let (task, project_identifier) = split_project_tag(&body);

    Some(TodoEntry {
        raw_line: line.to_string(),
        task,
        project_identifier,
        is_completed,
        time_info,
    })
}

/// Pull `@started(..)`, `@done(..)` and `@lasted(..)` out of `text`,
/// returning the trimmed remainder and whatever annotations were found.
pub fn split_time_annotations(text: &str) -> (String, TimeInfo) {
    let info = extract_time_info(text);
    let rest = ANNOTATION_RE.replace_all(text, "").trim().to_string();
    (rest, info)
}

fn extract_time_info(text: &str) -> TimeInfo {
    let mut info = TimeInfo::default();
    for caps in ANNOTATION_RE.captures_iter(text) {
        let value = caps["value"].trim().to_string();
        let slot = match &caps["name"] {
            "started" => &mut info.started,
            "done" => &mut info.done,
            _ => &mut info.lasted,
        };
        // First occurrence wins.
        if slot.is_none() {
            *slot = Some(value);
        }
    }
    info
}

/// `[X] rest` -> ("rest", Some("X")). Keeps the text untouched when the
/// tag or the remaining task would be empty.
fn split_project_tag(body: &str) -> (String, Option<String>) {
    if let Some(caps) = PROJECT_TAG_RE.captures(body) {
        let tag = caps["tag"].trim();
        let rest = caps["rest"].trim();
        if !tag.is_empty() && !rest.is_empty() {
            return (rest.to_string(), Some(tag.to_string()));
        }
    }
    (body.to_string(), None)
}
