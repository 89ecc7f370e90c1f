use serde::Serialize;

use crate::page::page_id::PageIdentifier;
use crate::snapshot::snapshot_model::now_millis;

/// One line of the agent's JSONL journal.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u64,
    pub page_id: String,
    pub action: String,

    pub fields: Option<usize>,
    pub attempt: Option<u32>,
    pub detail: Option<String>,
}

impl TraceEvent {
    pub fn now(page: &PageIdentifier, action: &str) -> Self {
        Self {
            timestamp_ms: now_millis(),
            page_id: page.to_string(),
            action: action.to_string(),
            fields: None,
            attempt: None,
            detail: None,
        }
    }

    pub fn with_fields(mut self, fields: usize) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}
