use thiserror::Error;

use crate::page::error::PageError;
use crate::store::error::StoreError;

/// Page-level failures of save/restore. Field-level problems never get here.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Page(#[from] PageError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
