use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::agent::agent_model::PageEvent;
use crate::dom::error::DomError;

/// Document shared between the hosting page and its agent.
///
/// Guards must be dropped before any `.await`.
pub type SharedDocument = Arc<Mutex<Document>>;

// ============================================================================
// Node model
// ============================================================================

/// Opaque handle to an element in a `Document` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

/// Events a field can receive. Mirrors the subset of DOM events the agent
/// listens for or synthesizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    Input,
    Change,
    Keyup,
    Blur,
    Click,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub name: Option<String>,
    /// Raw `type` attribute as written in markup.
    pub input_type: Option<String>,
    pub value: String,
    pub checked: bool,
    pub options: Vec<SelectOption>,
    pub selected_index: Option<usize>,
    /// Set when page code has replaced the `value` property with one that throws.
    pub value_locked: bool,

    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            id: None,
            name: None,
            input_type: None,
            value: String::new(),
            checked: false,
            options: Vec::new(),
            selected_index: None,
            value_locked: false,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn input(input_type: &str) -> Self {
        Self::new("input").with_type(input_type)
    }

    /// A `<select>` with the given options; the first option is selected,
    /// as a browser does for single-select dropdowns.
    pub fn select(options: Vec<SelectOption>) -> Self {
        let mut el = Self::new("select");
        el.selected_index = if options.is_empty() { None } else { Some(0) };
        el.options = options;
        el
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_type(mut self, input_type: &str) -> Self {
        self.input_type = Some(input_type.to_string());
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn with_selected(mut self, index: Option<usize>) -> Self {
        self.selected_index = index.filter(|i| *i < self.options.len());
        self
    }

    /// Non-empty `id` attribute, if any.
    pub fn dom_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|s| !s.is_empty())
    }

    /// Non-empty `name` attribute, if any.
    pub fn dom_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|s| !s.is_empty())
    }

    /// The DOM `tagName` property (upper-case).
    pub fn tag_name(&self) -> String {
        self.tag.to_ascii_uppercase()
    }

    /// The DOM `type` property: normalized input type, or the fixed type of
    /// `textarea` / `select`.
    pub fn type_property(&self) -> String {
        match self.tag.as_str() {
            "input" => self
                .input_type
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(|t| t.to_ascii_lowercase())
                .unwrap_or_else(|| "text".to_string()),
            "textarea" => "textarea".to_string(),
            "select" => "select-one".to_string(),
            _ => String::new(),
        }
    }

    /// Current value as the DOM `value` property reports it.
    pub fn current_value(&self) -> String {
        if self.tag == "select" {
            return self
                .selected_index
                .and_then(|i| self.options.get(i))
                .map(|o| o.value.clone())
                .unwrap_or_default();
        }
        self.value.clone()
    }

    /// The DOM `selectedIndex` property (-1 when nothing is selected).
    pub fn selected_index_property(&self) -> i64 {
        self.selected_index.map(|i| i as i64).unwrap_or(-1)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// How many dispatched events the journal keeps; older entries are dropped.
pub const DISPATCH_JOURNAL_LIMIT: usize = 256;

/// Record of an event dispatched on a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchedEvent {
    pub target: NodeId,
    pub kind: EventKind,
}

struct Listener {
    kinds: Vec<EventKind>,
    sink: UnboundedSender<PageEvent>,
}

// ============================================================================
// Document
// ============================================================================

/// In-memory element tree standing in for a browser document.
///
/// Nodes are never freed: removal only detaches them, so stale handles stay
/// valid to look up but are reported as detached.
pub struct Document {
    nodes: Vec<Element>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
    listeners: HashMap<NodeId, Vec<Listener>>,
    observers: Vec<UnboundedSender<PageEvent>>,
    dispatched: VecDeque<DispatchedEvent>,
}

impl Document {
    /// Create `<html><head></head><body></body></html>`.
    pub fn new() -> Self {
        let mut doc = Document {
            nodes: vec![Element::new("html")],
            root: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
            listeners: HashMap::new(),
            observers: Vec::new(),
            dispatched: VecDeque::new(),
        };
        doc.head = doc.push_node(Element::new("head"), Some(doc.root));
        doc.body = doc.push_node(Element::new("body"), Some(doc.root));
        doc
    }

    pub fn into_shared(self) -> SharedDocument {
        Arc::new(Mutex::new(self))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn element(&self, node: NodeId) -> Result<&Element, DomError> {
        self.nodes.get(node.0).ok_or(DomError::UnknownNode(node))
    }

    fn element_mut(&mut self, node: NodeId) -> Result<&mut Element, DomError> {
        self.nodes.get_mut(node.0).ok_or(DomError::UnknownNode(node))
    }

    fn push_node(&mut self, mut element: Element, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        element.parent = parent;
        element.children.clear();
        self.nodes.push(element);
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.push_node(element, None)
    }

    /// Create `element` and append it under `parent`.
    pub fn append(&mut self, parent: NodeId, element: Element) -> Result<NodeId, DomError> {
        let node = self.create_element(element);
        self.append_child(parent, node)?;
        Ok(node)
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.element(parent)?;
        self.element(child)?;
        if parent == child || self.ancestors(parent).contains(&child) {
            return Err(DomError::Hierarchy {
                parent,
                child,
                reason: "child is an ancestor of parent".into(),
            });
        }
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        if self.is_connected(parent) {
            self.notify_mutation();
        }
        Ok(())
    }

    /// Insert `child` as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.append_child(parent, child)?;
        let children = &mut self.nodes[parent.0].children;
        if let Some(last) = children.pop() {
            children.insert(0, last);
        }
        Ok(())
    }

    /// Detach `node` (and its subtree) from the document.
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        self.element(node)?;
        let was_connected = self.is_connected(node);
        self.detach(node);
        if was_connected {
            self.notify_mutation();
        }
        Ok(())
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    /// Ancestors of `node`, nearest first, ending at a parentless node.
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.nodes.get(node.0).and_then(|e| e.parent);
        while let Some(p) = current {
            out.push(p);
            current = self.nodes[p.0].parent;
        }
        out
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        node == self.root || self.ancestors(node).last() == Some(&self.root)
    }

    /// 1-based position of `node` among its parent's element children.
    pub fn sibling_index(&self, node: NodeId) -> Option<usize> {
        let parent = self.nodes.get(node.0)?.parent?;
        self.nodes[parent.0]
            .children
            .iter()
            .position(|c| *c == node)
            .map(|i| i + 1)
    }

    /// Connected nodes in document (pre-)order.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            out.push(n);
            for child in self.nodes[n.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Every connected `input`, `textarea` and `select`, in document order.
    pub fn query_form_controls(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|n| matches!(self.nodes[n.0].tag.as_str(), "input" | "textarea" | "select"))
            .collect()
    }

    // ------------------------------------------------------------------------
    // Property setters
    // ------------------------------------------------------------------------

    fn writable(&mut self, node: NodeId) -> Result<&mut Element, DomError> {
        if !self.is_connected(node) {
            self.element(node)?;
            return Err(DomError::Detached(node));
        }
        let el = self.element_mut(node)?;
        if el.value_locked {
            return Err(DomError::ValueRejected {
                node,
                reason: "value property is locked by page script".into(),
            });
        }
        Ok(el)
    }

    /// Native `value` setter. On a `select` this selects the first option
    /// with a matching value.
    pub fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), DomError> {
        let el = self.writable(node)?;
        if el.tag == "select" {
            el.selected_index = el.options.iter().position(|o| o.value == value);
        } else {
            el.value = value.to_string();
        }
        Ok(())
    }

    /// Native `checked` setter. Checking a radio unchecks the rest of its group.
    pub fn set_checked(&mut self, node: NodeId, checked: bool) -> Result<(), DomError> {
        let el = self.writable(node)?;
        el.checked = checked;
        let is_radio = el.type_property() == "radio";
        let group = el.dom_name().map(str::to_string);

        if checked && is_radio {
            if let Some(group) = group {
                for other in self.query_form_controls() {
                    if other == node {
                        continue;
                    }
                    let o = &mut self.nodes[other.0];
                    if o.type_property() == "radio" && o.dom_name() == Some(group.as_str()) {
                        o.checked = false;
                    }
                }
            }
        }
        Ok(())
    }

    /// Mark a field's `value` property as throwing on write.
    pub fn lock_value(&mut self, node: NodeId) -> Result<(), DomError> {
        self.element_mut(node)?.value_locked = true;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    pub fn add_listener(
        &mut self,
        node: NodeId,
        kinds: &[EventKind],
        sink: UnboundedSender<PageEvent>,
    ) -> Result<(), DomError> {
        self.element(node)?;
        self.listeners.entry(node).or_default().push(Listener {
            kinds: kinds.to_vec(),
            sink,
        });
        Ok(())
    }

    /// Number of listener registrations on `node`.
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.listeners.get(&node).map_or(0, Vec::len)
    }

    /// Register a subtree observer; every structural change in the connected
    /// tree sends `PageEvent::DomMutated`.
    pub fn observe_mutations(&mut self, sink: UnboundedSender<PageEvent>) {
        self.observers.push(sink);
    }

    fn notify_mutation(&mut self) {
        self.observers
            .retain(|sink| sink.send(PageEvent::DomMutated).is_ok());
    }

    /// Dispatch a bubbling event at `node`.
    pub fn dispatch(&mut self, node: NodeId, kind: EventKind) -> Result<(), DomError> {
        self.element(node)?;
        if self.dispatched.len() == DISPATCH_JOURNAL_LIMIT {
            self.dispatched.pop_front();
        }
        self.dispatched.push_back(DispatchedEvent { target: node, kind });

        let mut path = vec![node];
        path.extend(self.ancestors(node));
        for current in path {
            if let Some(listeners) = self.listeners.get_mut(&current) {
                // A closed sink means the agent is gone; drop its listener.
                listeners.retain(|l| {
                    !l.kinds.contains(&kind)
                        || l.sink.send(PageEvent::Field { node, kind }).is_ok()
                });
            }
        }
        Ok(())
    }

    /// The most recent dispatched events, oldest first.
    pub fn dispatched(&self) -> impl Iterator<Item = &DispatchedEvent> {
        self.dispatched.iter()
    }

    pub fn dispatched_on(&self, node: NodeId) -> Vec<EventKind> {
        self.dispatched
            .iter()
            .filter(|e| e.target == node)
            .map(|e| e.kind)
            .collect()
    }

    // ------------------------------------------------------------------------
    // User actions
    // ------------------------------------------------------------------------

    /// Replace a text field's value the way typing does: input then keyup.
    pub fn type_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        self.set_value(node, text)?;
        self.dispatch(node, EventKind::Input)?;
        self.dispatch(node, EventKind::Keyup)
    }

    /// Click a checkbox or radio.
    pub fn click(&mut self, node: NodeId) -> Result<(), DomError> {
        let el = self.element(node)?;
        let next = match el.type_property().as_str() {
            "checkbox" => !el.checked,
            "radio" => true,
            _ => el.checked,
        };
        self.set_checked(node, next)?;
        self.dispatch(node, EventKind::Click)?;
        self.dispatch(node, EventKind::Input)?;
        self.dispatch(node, EventKind::Change)
    }

    /// Pick a dropdown option by value.
    pub fn choose(&mut self, node: NodeId, value: &str) -> Result<(), DomError> {
        self.set_value(node, value)?;
        self.dispatch(node, EventKind::Input)?;
        self.dispatch(node, EventKind::Change)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
