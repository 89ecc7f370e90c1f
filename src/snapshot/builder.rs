use std::collections::BTreeMap;

use crate::dom::document::{Document, NodeId};
use crate::field::identity::identify;
use crate::snapshot::snapshot_model::{FieldSnapshot, PageSnapshot, VariantValue};

/// Capture `fields` into a snapshot, or `None` when nothing on the page is
/// worth persisting.
///
/// An all-blank form returns `None` so that an earlier, richer snapshot is
/// not overwritten with empty values. Handles that no longer resolve are
/// skipped.
pub fn build_snapshot(
    doc: &Document,
    fields: &[NodeId],
    source_url: &str,
    saved_at: u64,
) -> Option<PageSnapshot> {
    let mut captured: BTreeMap<_, FieldSnapshot> = BTreeMap::new();
    let mut has_data = false;

    for &node in fields {
        let (el, identity) = match doc.element(node).and_then(|el| Ok((el, identify(doc, node)?))) {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!(?node, error = %e, "skipping stale field handle");
                continue;
            }
        };

        let snapshot = FieldSnapshot::capture(el);
        has_data |= snapshot.value.has_data();

        // Radios sharing a name share an identity; keep the checked one.
        if let (Some(VariantValue::Radio(prev)), VariantValue::Radio(next)) =
            (captured.get(&identity).map(|f| &f.value), &snapshot.value)
        {
            if prev.checked && !next.checked {
                continue;
            }
        }

        captured.insert(identity, snapshot);
    }

    if !has_data {
        return None;
    }

    Some(PageSnapshot {
        fields: captured,
        saved_at,
        source_url: source_url.to_string(),
    })
}
