//! Ticket tracker collaborator and universe fetching.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

use ticklog_core::TicketRecord;
use ticklog_ingest::{search_fields, SearchPage, WorklogDraft};

#[async_trait]
pub trait TicketSource: Send + Sync {
    async fn search_tickets(
        &self,
        query: &str,
        fields: &[&str],
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<SearchPage>;

    async fn get_ticket_by_key(&self, key: &str) -> Result<TicketRecord>;

    async fn submit_worklog(&self, issue_key: &str, draft: &WorklogDraft) -> Result<()>;
}

/// Page through a search and return unique tickets in tracker order.
/// Stops at the last page, a missing or repeated token, or `max_pages`.
pub async fn fetch_universe(
    source: &dyn TicketSource,
    query: &str,
    page_size: usize,
    max_pages: usize,
) -> Result<Vec<Arc<TicketRecord>>> {
    let fields = search_fields();
    let mut seen_keys: HashSet<String> = HashSet::new();
    let mut seen_tokens: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    let mut token: Option<String> = None;

    for page_no in 1..=max_pages.max(1) {
        let page = source
            .search_tickets(query, &fields, page_size, token.as_deref())
            .await
            .with_context(|| format!("ticket search page {page_no}"))?;

        debug!(page = page_no, issues = page.issues.len(), is_last = page.is_last, "fetched ticket page");

        for t in page.issues {
            if seen_keys.insert(t.key.clone()) {
                out.push(Arc::new(t));
            }
        }

        if page.is_last {
            break;
        }
        match page.next_page_token {
            Some(next) if seen_tokens.insert(next.clone()) => token = Some(next),
            Some(next) => {
                warn!(token = %next, "ticket search repeated a page token; stopping");
                break;
            }
            None => break,
        }
    }

    Ok(out)
}
