//! Jira REST payloads -> TicketRecord.
//!
//! Expected issue shape (v3 API):
//!   { "key": "EW-1",
//!     "fields": { "summary": "...", "description": <ADF doc | string | null>,
//!                 "status": {"name": "Open"}, "issuetype": {"name": "Bug"},
//!                 "assignee": {"displayName": "..."}, "reporter": {...},
//!                 "parent": {"key": "EW-100"} } }

use anyhow::{Result, bail};
use serde_json::Value;
use ticklog_core::ticket::{TicketRecord, UNASSIGNED, UNKNOWN_REPORTER};

use crate::types::SearchPage;

/// Fields requested from the search endpoint.
pub fn search_fields() -> Vec<&'static str> {
    vec![
        "summary",
        "description",
        "status",
        "issuetype",
        "assignee",
        "reporter",
        "parent",
    ]
}

fn str_at<'a>(v: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut cur = v;
    for p in path {
        cur = cur.get(*p)?;
    }
    cur.as_str()
}

const BLOCK_NODES: &[&str] = &[
    "paragraph",
    "heading",
    "listItem",
    "codeBlock",
    "blockquote",
    "tableRow",
];

fn collect_adf_text(node: &Value, out: &mut String) {
    match node {
        Value::String(s) => out.push_str(s),
        Value::Array(items) => {
            for i in items {
                collect_adf_text(i, out);
            }
        }
        Value::Object(map) => {
            if let Some(t) = map.get("text").and_then(Value::as_str) {
                out.push_str(t);
            }
            if map.get("type").and_then(Value::as_str) == Some("hardBreak") {
                out.push('\n');
            }
            if let Some(children) = map.get("content") {
                collect_adf_text(children, out);
            }
            let is_block = map
                .get("type")
                .and_then(Value::as_str)
                .is_some_and(|t| BLOCK_NODES.contains(&t));
            if is_block && !out.ends_with('\n') {
                out.push('\n');
            }
        }
        _ => {}
    }
}

/// Flatten a description that is either plain text or an ADF document.
pub fn description_text(v: &Value) -> String {
    let mut out = String::new();
    collect_adf_text(v, &mut out);
    out.trim().to_string()
}

/// `None` for an issue without a key.
pub fn parse_issue(v: &Value) -> Option<TicketRecord> {
    let key = v.get("key").and_then(Value::as_str).map(str::trim)?;
    if key.is_empty() {
        return None;
    }
    let fields = v.get("fields").unwrap_or(&Value::Null);

    Some(TicketRecord {
        key: key.to_string(),
        summary: str_at(fields, &["summary"]).unwrap_or_default().to_string(),
        description: fields.get("description").map(description_text).unwrap_or_default(),
        status: str_at(fields, &["status", "name"]).unwrap_or_default().to_string(),
        issue_type: str_at(fields, &["issuetype", "name"]).unwrap_or_default().to_string(),
        assignee: str_at(fields, &["assignee", "displayName"])
            .unwrap_or(UNASSIGNED)
            .to_string(),
        reporter: str_at(fields, &["reporter", "displayName"])
            .unwrap_or(UNKNOWN_REPORTER)
            .to_string(),
        parent_key: str_at(fields, &["parent", "key"]).map(str::to_string),
    })
}

/// Search envelope: `{ "issues": [...], "isLast": bool, "nextPageToken": "..." }`.
/// A missing `isLast` is inferred from the absence of a next token.
pub fn parse_search_page(v: &Value) -> Result<SearchPage> {
    let Some(issues) = v.get("issues").and_then(Value::as_array) else {
        bail!("search response has no issues array");
    };
    let next_page_token = v
        .get("nextPageToken")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    let is_last = v
        .get("isLast")
        .and_then(Value::as_bool)
        .unwrap_or(next_page_token.is_none());

    Ok(SearchPage {
        issues: issues.iter().filter_map(parse_issue).collect(),
        is_last,
        next_page_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_issue_full() {
        let v = json!({
            "key": "EW-1",
            "fields": {
                "summary": "[MyDebit] Fix login",
                "description": {
                    "type": "doc", "version": 1,
                    "content": [
                        {"type": "paragraph", "content": [{"type": "text", "text": "Timeout after"}, {"type": "text", "text": " 30s"}]},
                        {"type": "paragraph", "content": [{"type": "text", "text": "Second line"}]}
                    ]
                },
                "status": {"name": "In Progress"},
                "issuetype": {"name": "Bug"},
                "assignee": {"displayName": "Sam Lee"},
                "reporter": null,
                "parent": {"key": "EW-100"}
            }
        });
        let t = parse_issue(&v).unwrap();
        assert_eq!(t.key, "EW-1");
        assert_eq!(t.summary, "[MyDebit] Fix login");
        assert_eq!(t.description, "Timeout after 30s\nSecond line");
        assert_eq!(t.status, "In Progress");
        assert_eq!(t.issue_type, "Bug");
        assert_eq!(t.assignee, "Sam Lee");
        assert_eq!(t.reporter, "Unknown");
        assert_eq!(t.parent_key.as_deref(), Some("EW-100"));
    }

    #[test]
    fn test_parse_issue_defaults() {
        let v = json!({"key": "EW-2", "fields": {"summary": "x", "description": "plain text"}});
        let t = parse_issue(&v).unwrap();
        assert_eq!(t.description, "plain text");
        assert_eq!(t.assignee, "Unassigned");
        assert_eq!(t.status, "");
    }

    #[test]
    fn test_parse_issue_without_key_dropped() {
        assert!(parse_issue(&json!({"fields": {"summary": "x"}})).is_none());
        assert!(parse_issue(&json!({"key": "  "})).is_none());
    }

    #[test]
    fn test_parse_search_page() {
        let v = json!({
            "issues": [{"key": "A-1", "fields": {"summary": "a"}}, {"fields": {}}],
            "nextPageToken": "tok"
        });
        let page = parse_search_page(&v).unwrap();
        assert_eq!(page.issues.len(), 1);
        assert!(!page.is_last);
        assert_eq!(page.next_page_token.as_deref(), Some("tok"));

        let last = parse_search_page(&json!({"issues": [], "isLast": true})).unwrap();
        assert!(last.is_last);
    }

    #[test]
    fn test_parse_search_page_rejects_bad_envelope() {
        assert!(parse_search_page(&json!({"errorMessages": ["nope"]})).is_err());
    }
}
