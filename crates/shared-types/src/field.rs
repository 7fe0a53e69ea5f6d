//! Positioned fields: the normalized definitions and the renderer-facing output

use crate::mapping::RawGeometry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-left screen position in whole pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenPosition {
    pub x: i64,
    pub y: i64,
}

/// Rectangle in PDF space (lower-left origin, points)
///
/// All-zero is the "unpositioned" sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfRect {
    pub llx: f64,
    pub lly: f64,
    pub urx: f64,
    pub ury: f64,
}

impl PdfRect {
    pub const UNPOSITIONED: PdfRect = PdfRect {
        llx: 0.0,
        lly: 0.0,
        urx: 0.0,
        ury: 0.0,
    };

    pub fn is_unpositioned(&self) -> bool {
        *self == Self::UNPOSITIONED
    }

    /// Express this rectangle as raw corner values, the shape stored entries use
    pub fn as_geometry(&self) -> RawGeometry {
        RawGeometry {
            llx: Some(Value::from(self.llx)),
            lly: Some(Value::from(self.lly)),
            urx: Some(Value::from(self.urx)),
            ury: Some(Value::from(self.ury)),
            ..RawGeometry::default()
        }
    }
}

/// The `type` of a projected field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Text,
    Signature,
    MoreFile,
    Checkbox,
    Radio,
    Days,
    Months,
    Years,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Signature => "signature",
            FieldType::MoreFile => "moreFile",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::Days => "days",
            FieldType::Months => "months",
            FieldType::Years => "years",
        }
    }
}

/// Which component of a date a date field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePart {
    #[default]
    Days,
    Months,
    Years,
}

impl DatePart {
    /// Parse a stored sub-type; anything unrecognized is `Days`
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("months") => DatePart::Months,
            Some("years") => DatePart::Years,
            _ => DatePart::Days,
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            DatePart::Days => "DD",
            DatePart::Months => "MM",
            DatePart::Years => "YYYY",
        }
    }

    pub fn max_length(self) -> u32 {
        match self {
            DatePart::Days | DatePart::Months => 2,
            DatePart::Years => 4,
        }
    }

    pub fn field_type(self) -> FieldType {
        match self {
            DatePart::Days => FieldType::Days,
            DatePart::Months => FieldType::Months,
            DatePart::Years => FieldType::Years,
        }
    }
}

/// Where a field sits: its step, page and both coordinate forms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub step_index: String,
    pub page_number: u32,
    pub position: ScreenPosition,
    pub rect: PdfRect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedField {
    pub id: String,
    pub placement: Placement,
    pub required: bool,
    pub value: Option<String>,
    pub config: Map<String, Value>,
    pub style: Value,
}

/// One option of a checkbox or radio group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupOption {
    pub id: String,
    pub placement: Placement,
    pub required: bool,
    pub parent_id: Option<String>,
    pub option_index: usize,
    pub checked: bool,
    pub label: Option<String>,
    pub config: Map<String, Value>,
    pub style: Value,
}

/// One day / month / year component of a date group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateComponent {
    pub id: String,
    pub placement: Placement,
    pub required: bool,
    pub part: DatePart,
    pub parent_id: Option<String>,
    pub option_index: usize,
    pub value: Option<String>,
    pub style: Value,
}

/// An attachment placeholder; not a positioned widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub step_index: String,
    pub required: bool,
    pub attributes: Map<String, Value>,
}

/// A normalized field definition, discriminated by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FieldDefinition {
    Text(PlacedField),
    Signature(PlacedField),
    CheckboxOption(GroupOption),
    RadioOption(GroupOption),
    DateComponent(DateComponent),
    Attachment(Attachment),
}

impl FieldDefinition {
    pub fn step_index(&self) -> &str {
        match self {
            FieldDefinition::Text(f) | FieldDefinition::Signature(f) => &f.placement.step_index,
            FieldDefinition::CheckboxOption(o) | FieldDefinition::RadioOption(o) => {
                &o.placement.step_index
            }
            FieldDefinition::DateComponent(d) => &d.placement.step_index,
            FieldDefinition::Attachment(a) => &a.step_index,
        }
    }
}

/// The value a widget starts with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

/// A rendering-ready field, filtered to the acting party's steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedField {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub step_index: String,
    pub page_number: u32,
    pub screen_position: ScreenPosition,
    pub pdf_rect: PdfRect,
    pub value: FieldValue,
    pub config: Value,
    pub style: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_index: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_sentinel_rect() {
        assert!(PdfRect::default().is_unpositioned());
        let rect = PdfRect {
            llx: 0.0,
            lly: 0.0,
            urx: 1.0,
            ury: 0.0,
        };
        assert!(!rect.is_unpositioned());
    }

    #[test]
    fn test_date_part_defaults_to_days() {
        assert_eq!(DatePart::parse(Some("years")), DatePart::Years);
        assert_eq!(DatePart::parse(Some("weeks")), DatePart::Days);
        assert_eq!(DatePart::parse(None), DatePart::Days);
        assert_eq!(DatePart::Years.placeholder(), "YYYY");
        assert_eq!(DatePart::Months.max_length(), 2);
        assert_eq!(DatePart::Years.max_length(), 4);
    }

    #[test]
    fn test_field_type_serializes_camel_case() {
        assert_eq!(serde_json::to_value(FieldType::MoreFile).unwrap(), json!("moreFile"));
        assert_eq!(serde_json::to_value(FieldType::Days).unwrap(), json!("days"));
    }

    #[test]
    fn test_field_definition_is_tagged_by_kind() {
        let def = FieldDefinition::Attachment(Attachment {
            id: "moreFile-0".into(),
            step_index: "2".into(),
            required: false,
            attributes: Map::new(),
        });
        let encoded = serde_json::to_value(&def).unwrap();
        assert_eq!(encoded["kind"], json!("attachment"));
        assert_eq!(def.step_index(), "2");

        let decoded: FieldDefinition = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, def);
    }

    #[test]
    fn test_projected_field_omits_group_members_when_absent() {
        let field = ProjectedField {
            id: "t1".into(),
            field_type: FieldType::Text,
            step_index: "1".into(),
            page_number: 1,
            screen_position: ScreenPosition { x: 3, y: 4 },
            pdf_rect: PdfRect::UNPOSITIONED,
            value: FieldValue::default(),
            config: json!({}),
            style: json!({}),
            parent_id: None,
            option_index: None,
        };
        let encoded = serde_json::to_value(&field).unwrap();
        assert_eq!(encoded["type"], json!("text"));
        assert_eq!(encoded["value"], json!(""));
        assert_eq!(encoded["screenPosition"], json!({"x": 3, "y": 4}));
        assert!(encoded.get("parentId").is_none());
    }
}
