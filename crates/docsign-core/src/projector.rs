//! Field projection
//!
//! Turns a document's raw `mappingData` into the flat list of positioned
//! fields the acting party may see, in two passes:
//!
//! 1. **Normalize**: walk the collections in [`CollectionKind::ORDER`], keep
//!    entries whose `stepIndex` is active, expand checkbox/radio groups per
//!    option and date groups per component, and produce [`FieldDefinition`]s.
//! 2. **Render**: map each definition to a [`ProjectedField`] with its
//!    default value and config.
//!
//! A malformed entry (or a malformed element inside a group) is skipped on
//! its own and reported as [`ProjectionIssue::ValidationSkipped`]; the rest of
//! the collection is still projected.

use crate::error::ProjectionIssue;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use shared_pdf::coords::{derive_position, to_pdf_rect};
use shared_types::lenient::{boolean, number};
use shared_types::{
    Attachment, CollectionKind, DateComponent, DatePart, FieldDefinition, FieldType, FieldValue,
    GroupOption, MappingCollections, PlacedField, Placement, ProjectedField, RawAttachment,
    RawDateElement, RawDateGroup, RawField, RawGeometry, RawOption, RawOptionGroup,
    ScreenPosition,
};
use std::collections::BTreeSet;
use tracing::{debug, warn};

const DEFAULT_PAGE: u32 = 1;

/// Projected fields plus the entries that were left out
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub fields: Vec<ProjectedField>,
    pub skipped: Vec<ProjectionIssue>,
}

/// Project the fields belonging to `active` steps
pub fn project(mapping: &MappingCollections, active: &BTreeSet<String>) -> Vec<ProjectedField> {
    project_with_report(mapping, active).fields
}

pub fn project_with_report(mapping: &MappingCollections, active: &BTreeSet<String>) -> Projection {
    let (definitions, skipped) = normalize(mapping, active);
    let fields: Vec<ProjectedField> = definitions.into_iter().map(render).collect();

    debug!(
        fields = fields.len(),
        skipped = skipped.len(),
        "projected mapping data"
    );

    Projection { fields, skipped }
}

/// First pass: typed definitions for every active leaf entry
pub fn normalize(
    mapping: &MappingCollections,
    active: &BTreeSet<String>,
) -> (Vec<FieldDefinition>, Vec<ProjectionIssue>) {
    let mut collector = Collector {
        active,
        definitions: Vec::new(),
        skipped: Vec::new(),
    };

    for kind in CollectionKind::ORDER {
        for (index, entry) in mapping.entries(kind).iter().enumerate() {
            collector.collect(kind, index, entry);
        }
    }

    (collector.definitions, collector.skipped)
}

struct Collector<'a> {
    active: &'a BTreeSet<String>,
    definitions: Vec<FieldDefinition>,
    skipped: Vec<ProjectionIssue>,
}

impl Collector<'_> {
    fn collect(&mut self, kind: CollectionKind, index: usize, entry: &Value) {
        match kind {
            CollectionKind::Text | CollectionKind::Signature => self.placed(kind, index, entry),
            CollectionKind::MoreFile => self.attachment(index, entry),
            CollectionKind::CheckboxGroup | CollectionKind::RadioGroup => {
                self.option_group(kind, index, entry)
            }
            CollectionKind::DateGroup => self.date_group(index, entry),
        }
    }

    fn placed(&mut self, kind: CollectionKind, index: usize, entry: &Value) {
        let Some(raw) = self.parse::<RawField>(kind, index, None, entry) else {
            return;
        };
        if !self.is_active(&raw.step_index) {
            return;
        }

        let is_signature = kind == CollectionKind::Signature;
        let type_name = if is_signature { "signature" } else { "text" };
        let required = raw.is_required();
        let field = PlacedField {
            id: raw.id.unwrap_or_else(|| format!("{}-{}", type_name, index)),
            required,
            placement: placement(
                raw.step_index,
                raw.page_number.as_ref(),
                DEFAULT_PAGE,
                &raw.geometry,
            ),
            value: if is_signature {
                None
            } else {
                raw.value.as_ref().and_then(text_value)
            },
            config: object(raw.config),
            style: raw.style.unwrap_or_else(empty_object),
        };

        self.definitions.push(if is_signature {
            FieldDefinition::Signature(field)
        } else {
            FieldDefinition::Text(field)
        });
    }

    fn attachment(&mut self, index: usize, entry: &Value) {
        let kind = CollectionKind::MoreFile;
        let Some(raw) = self.parse::<RawAttachment>(kind, index, None, entry) else {
            return;
        };
        if !self.is_active(&raw.step_index) {
            return;
        }

        let required = raw.is_required();
        self.definitions.push(FieldDefinition::Attachment(Attachment {
            id: raw.id.unwrap_or_else(|| format!("moreFile-{}", index)),
            step_index: raw.step_index,
            required,
            attributes: raw.attributes,
        }));
    }

    fn option_group(&mut self, kind: CollectionKind, index: usize, entry: &Value) {
        let Some(group) = self.parse::<RawOptionGroup>(kind, index, None, entry) else {
            return;
        };
        if !self.is_active(&group.step_index) {
            return;
        }

        let is_checkbox = kind == CollectionKind::CheckboxGroup;
        let type_name = if is_checkbox { "checkbox" } else { "radio" };
        let group_page = page_number(group.page_number.as_ref(), DEFAULT_PAGE);
        let config = object(group.config.clone());
        let required = group.is_required();

        for (element_index, element) in group.option_elements.iter().enumerate() {
            let Some(raw) = self.parse::<RawOption>(kind, index, Some(element_index), element)
            else {
                continue;
            };

            let checked = raw.state().and_then(boolean).unwrap_or(false);
            let option = GroupOption {
                id: raw
                    .id
                    .unwrap_or_else(|| format!("{}-{}-{}", type_name, index, element_index)),
                placement: placement(
                    group.step_index.clone(),
                    raw.page_number.as_ref(),
                    group_page,
                    &raw.geometry,
                ),
                required,
                parent_id: group.group_timestamp.clone(),
                option_index: element_index,
                checked,
                label: raw.label,
                config: config.clone(),
                style: raw
                    .style
                    .or_else(|| group.style.clone())
                    .unwrap_or_else(empty_object),
            };

            self.definitions.push(if is_checkbox {
                FieldDefinition::CheckboxOption(option)
            } else {
                FieldDefinition::RadioOption(option)
            });
        }
    }

    fn date_group(&mut self, index: usize, entry: &Value) {
        let kind = CollectionKind::DateGroup;
        let Some(group) = self.parse::<RawDateGroup>(kind, index, None, entry) else {
            return;
        };
        if !self.is_active(&group.step_index) {
            return;
        }

        let group_page = page_number(group.page_number.as_ref(), DEFAULT_PAGE);
        let required = group.is_required();

        for (element_index, element) in group.date_elements.iter().enumerate() {
            let Some(raw) =
                self.parse::<RawDateElement>(kind, index, Some(element_index), element)
            else {
                continue;
            };

            self.definitions.push(FieldDefinition::DateComponent(DateComponent {
                id: raw
                    .id
                    .unwrap_or_else(|| format!("date-{}-{}", index, element_index)),
                placement: placement(
                    group.step_index.clone(),
                    raw.page_number.as_ref(),
                    group_page,
                    &raw.geometry,
                ),
                required,
                part: DatePart::parse(raw.part.as_ref().and_then(Value::as_str)),
                parent_id: group.group_timestamp.clone(),
                option_index: element_index,
                value: raw.value.as_ref().and_then(text_value),
                style: raw.style.unwrap_or_else(empty_object),
            }));
        }
    }

    fn is_active(&self, step_index: &str) -> bool {
        self.active.contains(step_index)
    }

    /// Deserialize one entry, recording a skip when it is not a well-formed object
    fn parse<T: DeserializeOwned>(
        &mut self,
        collection: CollectionKind,
        index: usize,
        element: Option<usize>,
        entry: &Value,
    ) -> Option<T> {
        let result = if entry.is_object() {
            T::deserialize(entry).map_err(|e| e.to_string())
        } else {
            Err(format!("expected an object, got {}", json_type(entry)))
        };

        match result {
            Ok(parsed) => Some(parsed),
            Err(reason) => {
                warn!(
                    collection = %collection,
                    index,
                    element = ?element,
                    reason = %reason,
                    "skipping malformed mapping entry"
                );
                self.skipped.push(ProjectionIssue::ValidationSkipped {
                    collection,
                    index,
                    element,
                    reason,
                });
                None
            }
        }
    }
}

/// Second pass: one renderer-facing field per definition
pub fn render(definition: FieldDefinition) -> ProjectedField {
    match definition {
        FieldDefinition::Text(field) => {
            let value = field.value.clone().map(FieldValue::Text).unwrap_or_default();
            placed_field(FieldType::Text, value, field)
        }
        FieldDefinition::Signature(field) => {
            placed_field(FieldType::Signature, FieldValue::Text(String::new()), field)
        }
        FieldDefinition::CheckboxOption(option) => option_field(FieldType::Checkbox, option),
        FieldDefinition::RadioOption(option) => option_field(FieldType::Radio, option),
        FieldDefinition::DateComponent(date) => date_field(date),
        FieldDefinition::Attachment(attachment) => attachment_field(attachment),
    }
}

fn placed_field(field_type: FieldType, value: FieldValue, field: PlacedField) -> ProjectedField {
    let mut config = field.config;
    config
        .entry("required")
        .or_insert(Value::Bool(field.required));

    ProjectedField {
        id: field.id,
        field_type,
        step_index: field.placement.step_index,
        page_number: field.placement.page_number,
        screen_position: field.placement.position,
        pdf_rect: field.placement.rect,
        value,
        config: Value::Object(config),
        style: field.style,
        parent_id: None,
        option_index: None,
    }
}

fn option_field(field_type: FieldType, option: GroupOption) -> ProjectedField {
    let mut config = option.config;
    config
        .entry("required")
        .or_insert(Value::Bool(option.required));
    if let Some(label) = option.label {
        config.insert("label".into(), Value::String(label));
    }

    ProjectedField {
        id: option.id,
        field_type,
        step_index: option.placement.step_index,
        page_number: option.placement.page_number,
        screen_position: option.placement.position,
        pdf_rect: option.placement.rect,
        value: FieldValue::Bool(option.checked),
        config: Value::Object(config),
        style: option.style,
        parent_id: option.parent_id,
        option_index: Some(option.option_index),
    }
}

fn date_field(date: DateComponent) -> ProjectedField {
    // Placeholder and length come from the sub-type alone
    let mut config = Map::new();
    config.insert("placeholder".into(), Value::from(date.part.placeholder()));
    config.insert("maxLength".into(), Value::from(date.part.max_length()));
    config.insert("required".into(), Value::Bool(date.required));

    ProjectedField {
        id: date.id,
        field_type: date.part.field_type(),
        step_index: date.placement.step_index,
        page_number: date.placement.page_number,
        screen_position: date.placement.position,
        pdf_rect: date.placement.rect,
        value: FieldValue::Text(date.value.unwrap_or_default()),
        config: Value::Object(config),
        style: date.style,
        parent_id: date.parent_id,
        option_index: Some(date.option_index),
    }
}

fn attachment_field(attachment: Attachment) -> ProjectedField {
    let page = page_number(attachment.attributes.get("pageNumber"), DEFAULT_PAGE);
    let style = attachment
        .attributes
        .get("style")
        .cloned()
        .unwrap_or_else(empty_object);
    let value = attachment
        .attributes
        .get("value")
        .and_then(text_value)
        .unwrap_or_default();

    let mut config = attachment.attributes;
    config
        .entry("required")
        .or_insert(Value::Bool(attachment.required));

    ProjectedField {
        id: attachment.id,
        field_type: FieldType::MoreFile,
        step_index: attachment.step_index,
        page_number: page,
        screen_position: ScreenPosition::default(),
        pdf_rect: Default::default(),
        value: FieldValue::Text(value),
        config: Value::Object(config),
        style,
        parent_id: None,
        option_index: None,
    }
}

fn placement(
    step_index: String,
    page: Option<&Value>,
    default_page: u32,
    geometry: &RawGeometry,
) -> Placement {
    Placement {
        step_index,
        page_number: page_number(page, default_page),
        position: derive_position(geometry),
        rect: to_pdf_rect(geometry),
    }
}

fn page_number(value: Option<&Value>, default: u32) -> u32 {
    value
        .and_then(number)
        .filter(|n| *n >= 1.0 && *n <= f64::from(u32::MAX))
        .map(|n| n.trunc() as u32)
        .unwrap_or(default)
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn object(value: Option<Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Count of leaf entries in `mapping`, groups expanded, ignoring step membership
///
/// Matches the projection length when every step is active and no entry is
/// malformed.
pub fn leaf_count(mapping: &MappingCollections) -> usize {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Elements {
        #[serde(default)]
        option_elements: Vec<Value>,
        #[serde(default)]
        date_elements: Vec<Value>,
    }

    let elements = |v: &Value| {
        Elements::deserialize(v)
            .map(|e| e.option_elements.len() + e.date_elements.len())
            .unwrap_or(0)
    };

    mapping.text.len()
        + mapping.signature.len()
        + mapping.more_file.len()
        + mapping.checkbox_group.iter().map(elements).sum::<usize>()
        + mapping.radio_group.iter().map(elements).sum::<usize>()
        + mapping.date_group.iter().map(elements).sum::<usize>()
}
