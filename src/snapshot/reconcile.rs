use crate::dom::document::{Document, EventKind, NodeId};
use crate::field::identity::{FieldIdentity, identify};
use crate::snapshot::error::ReconcileError;
use crate::snapshot::snapshot_model::{FieldKind, FieldSnapshot, PageSnapshot, VariantValue};

/// Events synthesized after each restored field so page listeners see the
/// change as user input.
pub const RESTORE_EVENTS: [EventKind; 3] = [EventKind::Input, EventKind::Change, EventKind::Blur];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Restored,
    /// Matched but intentionally left alone (a radio that was not the saved choice)
    Unchanged,
}

/// Apply `snapshot` onto the live `fields`; returns how many were restored.
///
/// Fields missing from the snapshot are skipped. A field that fails to
/// apply is logged and excluded from the count; the rest still restore.
pub fn reconcile(doc: &mut Document, fields: &[NodeId], snapshot: &PageSnapshot) -> usize {
    let mut restored = 0;

    for &node in fields {
        let identity = match identify(doc, node) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(?node, error = %e, "cannot identify field, skipping");
                continue;
            }
        };
        let Some(saved) = snapshot.field(&identity) else {
            continue;
        };

        match apply_field(doc, node, &identity, saved) {
            Ok(Applied::Restored) => restored += 1,
            Ok(Applied::Unchanged) => {}
            Err(e) => tracing::warn!(field = %identity, error = %e, "restore failed for field"),
        }
    }

    restored
}

/// Write one saved value into a live field and fire the restore events.
pub fn apply_field(
    doc: &mut Document,
    node: NodeId,
    identity: &FieldIdentity,
    saved: &FieldSnapshot,
) -> Result<Applied, ReconcileError> {
    let dom_err = |source| ReconcileError::Dom {
        identity: identity.clone(),
        source,
    };
    let el = doc.element(node).map_err(dom_err)?;
    let kind = FieldKind::of(el);

    match (kind, &saved.value) {
        (FieldKind::Checkbox, VariantValue::Checked(checked)) => {
            doc.set_checked(node, *checked).map_err(dom_err)?;
        }
        (FieldKind::Radio, VariantValue::Radio(radio)) => {
            // Only the saved choice of the group is re-checked.
            if !radio.checked || el.current_value() != radio.value {
                return Ok(Applied::Unchanged);
            }
            doc.set_checked(node, true).map_err(dom_err)?;
        }
        (FieldKind::Select, VariantValue::Select(select)) => {
            doc.set_value(node, &select.value).map_err(dom_err)?;
        }
        (FieldKind::Text, VariantValue::Text(text)) => {
            doc.set_value(node, text).map_err(dom_err)?;
        }
        (FieldKind::Text, VariantValue::Absent) => {
            doc.set_value(node, "").map_err(dom_err)?;
        }
        (expected, other) => {
            return Err(ReconcileError::ShapeMismatch {
                identity: identity.clone(),
                expected,
                found: other.shape(),
            });
        }
    }

    for kind in RESTORE_EVENTS {
        doc.dispatch(node, kind).map_err(dom_err)?;
    }
    Ok(Applied::Restored)
}
