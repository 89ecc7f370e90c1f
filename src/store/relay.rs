use serde::{Deserialize, Serialize};

use crate::page::page_id::PageIdentifier;
use crate::snapshot::snapshot_model::PageSnapshot;
use crate::store::adapter::StoreAdapter;
use crate::store::store::KeyValueStore;

/// Request from the control surface, tagged by `action`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum RelayRequest {
    #[serde(rename = "saveFormData")]
    SaveFormData {
        #[serde(rename = "pageId")]
        page_id: PageIdentifier,
        data: PageSnapshot,
    },

    #[serde(rename = "getFormData")]
    GetFormData {
        #[serde(rename = "pageId")]
        page_id: PageIdentifier,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelayResponse {
    Failed { success: bool, error: String },
    Saved { success: bool },
    Data { data: Option<PageSnapshot> },
}

impl RelayResponse {
    fn failed(error: impl ToString) -> Self {
        RelayResponse::Failed {
            success: false,
            error: error.to_string(),
        }
    }
}

/// Serves control-surface reads and writes against the same store the page
/// agents use, independently of them.
pub struct Relay<S: KeyValueStore> {
    store: StoreAdapter<S>,
}

impl<S: KeyValueStore> Relay<S> {
    pub fn new(store: StoreAdapter<S>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, request: RelayRequest) -> RelayResponse {
        match request {
            RelayRequest::SaveFormData { page_id, data } => {
                match self.store.save_page(&page_id, data).await {
                    Ok(()) => RelayResponse::Saved { success: true },
                    Err(e) => RelayResponse::failed(e),
                }
            }
            RelayRequest::GetFormData { page_id } => {
                match self.store.page_snapshot(&page_id).await {
                    Ok(data) => RelayResponse::Data { data },
                    Err(e) => RelayResponse::failed(e),
                }
            }
        }
    }

    /// Handle one NDJSON request line and produce one response line.
    pub async fn handle_line(&self, line: &str) -> String {
        let response = match serde_json::from_str::<RelayRequest>(line.trim()) {
            Ok(request) => self.handle(request).await,
            Err(e) => RelayResponse::failed(format!("invalid request: {e}")),
        };
        serde_json::to_string(&response)
            .unwrap_or_else(|e| format!("{{\"success\":false,\"error\":\"{e}\"}}"))
    }
}
