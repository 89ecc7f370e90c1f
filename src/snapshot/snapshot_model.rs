use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::dom::document::Element;
use crate::field::identity::FieldIdentity;

// ============================================================================
// Field classification
// ============================================================================

/// How a field's state is captured and restored. Decided once per field from
/// its `type` and tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Checkbox,
    Radio,
    Select,
    Text,
}

impl FieldKind {
    pub fn of(el: &Element) -> FieldKind {
        match el.type_property().as_str() {
            "checkbox" => FieldKind::Checkbox,
            "radio" => FieldKind::Radio,
            _ if el.tag == "select" => FieldKind::Select,
            _ => FieldKind::Text,
        }
    }
}

// ============================================================================
// Stored values
// ============================================================================

/// Saved state of one radio input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioValue {
    pub checked: bool,
    pub value: String,
    pub name: String,
}

/// Saved state of a dropdown. `selected_index` is kept for diagnostics only;
/// restoring goes by `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectValue {
    pub selected_index: i64,
    pub value: String,
}

/// Field value in its stored JSON shape: a bare boolean for checkboxes,
/// `{checked, value, name}` for radios, `{selectedIndex, value}` for selects
/// and a bare string for everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariantValue {
    Checked(bool),
    Radio(RadioValue),
    Select(SelectValue),
    Text(String),
    /// Stored as `null`; restores as an empty string.
    Absent,
}

impl VariantValue {
    /// Read the current state of `el`.
    pub fn capture(el: &Element) -> VariantValue {
        match FieldKind::of(el) {
            FieldKind::Checkbox => VariantValue::Checked(el.checked),
            FieldKind::Radio => VariantValue::Radio(RadioValue {
                checked: el.checked,
                value: el.current_value(),
                name: el.name.clone().unwrap_or_default(),
            }),
            FieldKind::Select => VariantValue::Select(SelectValue {
                selected_index: el.selected_index_property(),
                value: el.current_value(),
            }),
            FieldKind::Text => VariantValue::Text(el.current_value()),
        }
    }

    /// Whether this value is worth persisting on its own.
    ///
    /// Checkbox and radio state always counts; a select only when it has a
    /// non-empty value; text only when non-empty.
    pub fn has_data(&self) -> bool {
        match self {
            VariantValue::Checked(_) | VariantValue::Radio(_) => true,
            VariantValue::Select(s) => !s.value.is_empty(),
            VariantValue::Text(s) => !s.is_empty(),
            VariantValue::Absent => false,
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            VariantValue::Checked(_) => "boolean",
            VariantValue::Radio(_) => "radio",
            VariantValue::Select(_) => "select",
            VariantValue::Text(_) => "string",
            VariantValue::Absent => "null",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    /// Upper-case tag name, e.g. `INPUT`
    pub tag: String,
    /// DOM `type` property, empty when the element has none
    #[serde(rename = "type", default)]
    pub field_type: String,
    pub value: VariantValue,
}

impl FieldSnapshot {
    pub fn capture(el: &Element) -> FieldSnapshot {
        FieldSnapshot {
            tag: el.tag_name(),
            field_type: el.type_property(),
            value: VariantValue::capture(el),
        }
    }
}

/// Every captured field on one page at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(rename = "data", alias = "fields")]
    pub fields: BTreeMap<FieldIdentity, FieldSnapshot>,

    /// Milliseconds since the Unix epoch
    #[serde(rename = "savedAt")]
    pub saved_at: u64,

    #[serde(rename = "url", alias = "sourceUrl")]
    pub source_url: String,
}

impl PageSnapshot {
    pub fn field(&self, identity: &FieldIdentity) -> Option<&FieldSnapshot> {
        self.fields.get(identity)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
