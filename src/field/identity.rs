use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dom::document::{Document, NodeId};
use crate::dom::error::DomError;

/// Stable key for a form field across save/restore cycles.
///
/// One of `id:<id>`, `name:<name>` or `xpath:<path>`, tried in that order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldIdentity(String);

impl FieldIdentity {
    pub fn new(raw: impl Into<String>) -> Self {
        FieldIdentity(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_structural(&self) -> bool {
        self.0.starts_with("xpath:")
    }
}

impl fmt::Display for FieldIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldIdentity {
    fn from(raw: &str) -> Self {
        FieldIdentity(raw.to_string())
    }
}

pub fn identify(doc: &Document, field: NodeId) -> Result<FieldIdentity, DomError> {
    let el = doc.element(field)?;
    if let Some(id) = el.dom_id() {
        return Ok(FieldIdentity(format!("id:{id}")));
    }
    if let Some(name) = el.dom_name() {
        return Ok(FieldIdentity(format!("name:{name}")));
    }
    Ok(FieldIdentity(format!("xpath:{}", xpath(doc, field)?)))
}

/// Absolute path of `node`, one `tag[n]` segment per ancestor step.
///
/// The walk stops at the first id-bearing element (`//*[@id="..."]`), at
/// `body` (`/html/body`), or at a node with no parent (`/<tag>`), so it
/// terminates for detached subtrees too.
pub fn xpath(doc: &Document, node: NodeId) -> Result<String, DomError> {
    let mut segments = Vec::new();
    let mut current = node;

    let anchor = loop {
        let el = doc.element(current)?;
        if let Some(id) = el.dom_id() {
            break format!("//*[@id=\"{id}\"]");
        }
        if current == doc.body() {
            break "/html/body".to_string();
        }
        match (el.parent(), doc.sibling_index(current)) {
            (Some(parent), Some(index)) => {
                segments.push(format!("{}[{}]", el.tag, index));
                current = parent;
            }
            _ => break format!("/{}", el.tag),
        }
    };

    let mut path = anchor;
    for segment in segments.iter().rev() {
        path.push('/');
        path.push_str(segment);
    }
    Ok(path)
}
