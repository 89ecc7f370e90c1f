use crate::dom::document::{Document, Element, NodeId};

/// `input` types that are never captured.
pub const EXCLUDED_INPUT_TYPES: [&str; 5] = ["password", "submit", "button", "image", "file"];

pub fn is_capturable(el: &Element) -> bool {
    match el.tag.as_str() {
        "textarea" | "select" => true,
        "input" => !el
            .input_type
            .as_deref()
            .is_some_and(|t| EXCLUDED_INPUT_TYPES.iter().any(|x| t.eq_ignore_ascii_case(x))),
        _ => false,
    }
}

/// Capturable fields currently in the document, in document order.
///
/// Handles go stale when the DOM changes; call again instead of caching.
pub fn enumerate_fields(doc: &Document) -> Vec<NodeId> {
    doc.query_form_controls()
        .into_iter()
        .filter(|n| doc.element(*n).is_ok_and(is_capturable))
        .collect()
}
