use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use ticklog_core::TicketRecord;
use ticklog_ingest::{parse_issue, parse_search_page, SearchPage, WorklogDraft};
use ticklog_match::TicketSource;

use crate::config::JiraSection;

/// Jira Cloud REST v3 with basic auth (email + API token).
pub struct JiraClient {
    client: reqwest::Client,
    base_url: String,
    email: String,
    api_token: String,
}

impl JiraClient {
    pub fn from_config(cfg: &JiraSection) -> Result<Self> {
        if cfg.base_url.trim().is_empty() {
            bail!("jira.base_url is not set; run: ticklog config init and edit the file");
        }
        if cfg.email.trim().is_empty() {
            bail!("jira.email is not set");
        }
        let api_token = cfg
            .resolved_api_token()
            .ok_or_else(|| anyhow!("missing Jira API token; set JIRA_API_TOKEN or jira.api_token"))?;
        let client = reqwest::Client::builder().build().context("build http client")?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            email: cfg.email.clone(),
            api_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, req: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let resp = req
            .basic_auth(&self.email, Some(&self.api_token))
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("jira {what} request"))?;
        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("jira {what} error: {status} {txt}");
        }
        Ok(resp)
    }
}

/// Worklog body with the comment as a single-paragraph ADF document.
pub fn worklog_payload(draft: &WorklogDraft) -> Value {
    json!({
        "comment": {
            "type": "doc",
            "version": 1,
            "content": [{
                "type": "paragraph",
                "content": [{ "type": "text", "text": draft.comment }]
            }]
        },
        "started": draft.started,
        "timeSpentSeconds": draft.duration_seconds,
    })
}

#[async_trait]
impl TicketSource for JiraClient {
    async fn search_tickets(
        &self,
        query: &str,
        fields: &[&str],
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<SearchPage> {
        let mut params = vec![
            ("jql", query.to_string()),
            ("fields", fields.join(",")),
            ("maxResults", max_results.to_string()),
        ];
        if let Some(t) = page_token {
            params.push(("nextPageToken", t.to_string()));
        }
        let req = self.client.get(self.url("/rest/api/3/search/jql")).query(&params);
        let v: Value = self.send(req, "search").await?.json().await.context("parse jira search")?;
        let page = parse_search_page(&v)?;
        debug!(issues = page.issues.len(), is_last = page.is_last, "jira search page");
        Ok(page)
    }

    async fn get_ticket_by_key(&self, key: &str) -> Result<TicketRecord> {
        let req = self.client.get(self.url(&format!("/rest/api/3/issue/{key}")));
        let v: Value = self.send(req, "issue").await?.json().await.context("parse jira issue")?;
        parse_issue(&v).ok_or_else(|| anyhow!("jira issue {key} has no key or fields"))
    }

    async fn submit_worklog(&self, issue_key: &str, draft: &WorklogDraft) -> Result<()> {
        let req = self
            .client
            .post(self.url(&format!("/rest/api/3/issue/{issue_key}/worklog")))
            .json(&worklog_payload(draft));
        self.send(req, "worklog").await?;
        info!(issue = issue_key, seconds = draft.duration_seconds, "worklog submitted");
        Ok(())
    }
}

/// Tickets read from a local JSON file: either a saved search response
/// (`{"issues": [...]}`) or a plain array of ticket records.
pub struct FileTicketSource {
    tickets: Vec<TicketRecord>,
}

impl FileTicketSource {
    pub fn from_json(text: &str) -> Result<Self> {
        let v: Value = serde_json::from_str(text).context("parse tickets json")?;
        let tickets = if v.is_array() {
            serde_json::from_value(v).context("parse ticket records")?
        } else {
            parse_search_page(&v)?.issues
        };
        Ok(Self { tickets })
    }
}

#[async_trait]
impl TicketSource for FileTicketSource {
    async fn search_tickets(
        &self,
        _query: &str,
        _fields: &[&str],
        _max_results: usize,
        _page_token: Option<&str>,
    ) -> Result<SearchPage> {
        Ok(SearchPage {
            issues: self.tickets.clone(),
            is_last: true,
            next_page_token: None,
        })
    }

    async fn get_ticket_by_key(&self, key: &str) -> Result<TicketRecord> {
        self.tickets
            .iter()
            .find(|t| t.key.eq_ignore_ascii_case(key))
            .cloned()
            .ok_or_else(|| anyhow!("ticket {key} not in file"))
    }

    async fn submit_worklog(&self, issue_key: &str, _draft: &WorklogDraft) -> Result<()> {
        bail!("cannot submit worklog for {issue_key}: ticket file is read-only")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worklog_payload_shape() {
        let d = WorklogDraft {
            issue_key: "EW-1".into(),
            comment: "Fix login".into(),
            started: "2024-01-02T10:00:00.000+0000".into(),
            duration_seconds: 3600,
        };
        let v = worklog_payload(&d);
        assert_eq!(v["timeSpentSeconds"], 3600);
        assert_eq!(v["started"], "2024-01-02T10:00:00.000+0000");
        assert_eq!(v["comment"]["content"][0]["content"][0]["text"], "Fix login");
    }

    #[tokio::test]
    async fn test_file_source_accepts_both_shapes() {
        let envelope = r#"{"issues": [{"key": "EW-1", "fields": {"summary": "Fix login"}}]}"#;
        let src = FileTicketSource::from_json(envelope).unwrap();
        let page = src.search_tickets("", &[], 10, None).await.unwrap();
        assert_eq!(page.issues.len(), 1);
        assert!(page.is_last);

        let records = serde_json::to_string(&vec![TicketRecord::new("EW-2", "Deploy")]).unwrap();
        let src = FileTicketSource::from_json(&records).unwrap();
        assert_eq!(src.get_ticket_by_key("ew-2").await.unwrap().summary, "Deploy");
        assert!(src.get_ticket_by_key("EW-9").await.is_err());
    }
}
