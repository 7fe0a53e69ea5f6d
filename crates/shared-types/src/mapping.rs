//! Raw field definitions as stored in a document's `mappingData`
//!
//! Each collection is kept as untyped JSON so one malformed entry can be
//! skipped without rejecting the document. The typed `Raw*` structs below are
//! what a single entry deserializes into.

use crate::lenient::{opt_string_or_number, string_or_number};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The collections of `mappingData`, one per field kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingCollections {
    #[serde(default)]
    pub text: Vec<Value>,
    #[serde(default)]
    pub signature: Vec<Value>,
    #[serde(default)]
    pub checkbox_group: Vec<Value>,
    #[serde(default)]
    pub radio_group: Vec<Value>,
    #[serde(default)]
    pub date_group: Vec<Value>,
    #[serde(default)]
    pub more_file: Vec<Value>,
}

impl MappingCollections {
    pub fn entries(&self, kind: CollectionKind) -> &[Value] {
        match kind {
            CollectionKind::Text => &self.text,
            CollectionKind::Signature => &self.signature,
            CollectionKind::MoreFile => &self.more_file,
            CollectionKind::CheckboxGroup => &self.checkbox_group,
            CollectionKind::RadioGroup => &self.radio_group,
            CollectionKind::DateGroup => &self.date_group,
        }
    }

    pub fn is_empty(&self) -> bool {
        CollectionKind::ORDER
            .iter()
            .all(|kind| self.entries(*kind).is_empty())
    }
}

/// Identifies one `mappingData` collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollectionKind {
    Text,
    Signature,
    MoreFile,
    CheckboxGroup,
    RadioGroup,
    DateGroup,
}

impl CollectionKind {
    /// Projection order; output ordering depends on it
    pub const ORDER: [CollectionKind; 6] = [
        CollectionKind::Text,
        CollectionKind::Signature,
        CollectionKind::MoreFile,
        CollectionKind::CheckboxGroup,
        CollectionKind::RadioGroup,
        CollectionKind::DateGroup,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CollectionKind::Text => "text",
            CollectionKind::Signature => "signature",
            CollectionKind::MoreFile => "moreFile",
            CollectionKind::CheckboxGroup => "checkboxGroup",
            CollectionKind::RadioGroup => "radioGroup",
            CollectionKind::DateGroup => "dateGroup",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position data as it appears on a raw entry
///
/// Screen position comes as `left`/`top` (or the older `scale_X`/`scale_Y`);
/// the PDF rectangle as `llx`/`lly`/`urx`/`ury`. Values may be numbers or
/// numeric strings, and any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGeometry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<Value>,
    #[serde(default, rename = "scale_X", skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<Value>,
    #[serde(default, rename = "scale_Y", skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llx: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lly: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urx: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ury: Option<Value>,
}

/// `required` wins over the older `isRequired` spelling when both are present
fn required_flag(required: Option<bool>, is_required: Option<bool>) -> bool {
    required.or(is_required).unwrap_or(false)
}

impl RawField {
    pub fn is_required(&self) -> bool {
        required_flag(self.required, self.is_required)
    }
}

impl RawOptionGroup {
    pub fn is_required(&self) -> bool {
        required_flag(self.required, self.is_required)
    }
}

impl RawDateGroup {
    pub fn is_required(&self) -> bool {
        required_flag(self.required, self.is_required)
    }
}

impl RawAttachment {
    pub fn is_required(&self) -> bool {
        required_flag(self.required, self.is_required)
    }
}

/// A text or signature entry
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawField {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub step_index: String,
    #[serde(default)]
    pub page_number: Option<Value>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub is_required: Option<bool>,
    #[serde(flatten)]
    pub geometry: RawGeometry,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub config: Option<Value>,
    #[serde(default)]
    pub style: Option<Value>,
}

/// A checkbox or radio group; each option element is one widget
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOptionGroup {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub group_timestamp: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub step_index: String,
    #[serde(default)]
    pub page_number: Option<Value>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub is_required: Option<bool>,
    #[serde(default)]
    pub option_elements: Vec<Value>,
    #[serde(default)]
    pub config: Option<Value>,
    #[serde(default)]
    pub style: Option<Value>,
}

/// One element of a checkbox or radio group
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOption {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub page_number: Option<Value>,
    #[serde(flatten)]
    pub geometry: RawGeometry,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub checked: Option<Value>,
    #[serde(default)]
    pub style: Option<Value>,
}

impl RawOption {
    /// The checked state: `checked` when present, else the legacy `value`
    pub fn state(&self) -> Option<&Value> {
        self.checked.as_ref().or(self.value.as_ref())
    }
}

/// A date group split into day / month / year components
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDateGroup {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub group_timestamp: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub step_index: String,
    #[serde(default)]
    pub page_number: Option<Value>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub is_required: Option<bool>,
    #[serde(default)]
    pub date_elements: Vec<Value>,
}

/// One component of a date group
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDateElement {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub part: Option<Value>,
    #[serde(default)]
    pub page_number: Option<Value>,
    #[serde(flatten)]
    pub geometry: RawGeometry,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub style: Option<Value>,
}

/// A `moreFile` attachment placeholder; everything else is carried verbatim
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAttachment {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub step_index: String,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub is_required: Option<bool>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collections_default_when_missing() {
        let mapping: MappingCollections =
            serde_json::from_value(json!({"text": [{"stepIndex": "1"}]})).unwrap();
        assert_eq!(mapping.text.len(), 1);
        assert!(mapping.checkbox_group.is_empty());
        assert!(!mapping.is_empty());
    }

    #[test]
    fn test_entries_follow_kind() {
        let mapping: MappingCollections = serde_json::from_value(json!({
            "radioGroup": [{}, {}],
            "moreFile": [{}]
        }))
        .unwrap();
        assert_eq!(mapping.entries(CollectionKind::RadioGroup).len(), 2);
        assert_eq!(mapping.entries(CollectionKind::MoreFile).len(), 1);
        assert_eq!(mapping.entries(CollectionKind::Text).len(), 0);
    }

    #[test]
    fn test_raw_field_reads_flattened_geometry() {
        let raw: RawField = serde_json::from_value(json!({
            "id": 5,
            "stepIndex": 1,
            "pageNumber": "2",
            "isRequired": true,
            "left": 10,
            "top": "20",
            "llx": "1.5", "lly": 2, "urx": 3, "ury": 4
        }))
        .unwrap();
        assert_eq!(raw.id.as_deref(), Some("5"));
        assert_eq!(raw.step_index, "1");
        assert!(raw.is_required());
        assert_eq!(raw.geometry.left, Some(json!(10)));
        assert_eq!(raw.geometry.llx, Some(json!("1.5")));
    }

    #[test]
    fn test_required_and_is_required_together() {
        let raw: RawField = serde_json::from_value(json!({
            "stepIndex": "1",
            "required": false,
            "isRequired": true
        }))
        .unwrap();
        assert!(!raw.is_required());

        let raw: RawDateGroup =
            serde_json::from_value(json!({"stepIndex": "1", "isRequired": true})).unwrap();
        assert!(raw.is_required());
    }

    #[test]
    fn test_option_with_value_and_checked() {
        let raw: RawOption = serde_json::from_value(json!({
            "value": "agree",
            "checked": true,
            "label": "I agree"
        }))
        .unwrap();
        assert_eq!(raw.state(), Some(&json!(true)));

        let legacy: RawOption = serde_json::from_value(json!({"value": true})).unwrap();
        assert_eq!(legacy.state(), Some(&json!(true)));
    }

    #[test]
    fn test_raw_field_requires_step_index() {
        let result: Result<RawField, _> = serde_json::from_value(json!({"id": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_raw_attachment_keeps_extra_attributes() {
        let raw: RawAttachment = serde_json::from_value(json!({
            "stepIndex": "3",
            "fileName": "passport.pdf",
            "maxSize": 10
        }))
        .unwrap();
        assert_eq!(raw.attributes.get("fileName"), Some(&json!("passport.pdf")));
        assert!(!raw.attributes.contains_key("stepIndex"));
    }

    #[test]
    fn test_collection_kind_names() {
        let names: Vec<_> = CollectionKind::ORDER.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            vec!["text", "signature", "moreFile", "checkboxGroup", "radioGroup", "dateGroup"]
        );
    }
}
