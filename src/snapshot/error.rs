use thiserror::Error;

use crate::dom::error::DomError;
use crate::field::identity::FieldIdentity;
use crate::snapshot::snapshot_model::FieldKind;

/// Failure to restore a single field. Never aborts a whole restore.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    #[error("DOM rejected restore of '{identity}': {source}")]
    Dom {
        identity: FieldIdentity,
        source: DomError,
    },

    /// Saved value has a different shape than the live field expects
    #[error("Saved value for '{identity}' is a {found}, field is {expected:?}")]
    ShapeMismatch {
        identity: FieldIdentity,
        expected: FieldKind,
        found: &'static str,
    },
}
