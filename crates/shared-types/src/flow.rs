//! Approval flow documents: steps, entities and status codes

use crate::lenient::string_or_number;
use crate::mapping::MappingCollections;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow status shared by documents and flow steps
///
/// Serialized as the single-letter codes used by existing consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "D")]
    Draft,
    #[serde(rename = "W")]
    Waiting,
    #[serde(rename = "N")]
    InProgress,
    #[serde(rename = "R")]
    Rejected,
    #[serde(rename = "C")]
    Canceled,
    #[serde(rename = "Y")]
    Completed,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Draft,
        Status::Waiting,
        Status::InProgress,
        Status::Rejected,
        Status::Canceled,
        Status::Completed,
    ];

    /// The single-letter wire code
    pub fn code(self) -> &'static str {
        match self {
            Status::Draft => "D",
            Status::Waiting => "W",
            Status::InProgress => "N",
            Status::Rejected => "R",
            Status::Canceled => "C",
            Status::Completed => "Y",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractType {
    B2b,
    B2c,
}

/// Who a flow step belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Sender,
    Personal,
}

/// Extra verification a step may demand before its fields unlock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidateType {
    Otp,
    Password,
}

/// A party (signer/approver) attached to a flow step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_card: Option<String>,
    #[serde(default, rename = "hasCA")]
    pub has_ca: bool,
    #[serde(default)]
    pub is_in_business: bool,
    #[serde(default)]
    pub nationality: String,
}

/// One stage in the approval sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStep {
    #[serde(deserialize_with = "string_or_number")]
    pub index: String,
    pub status: Status,
    pub type_entity: EntityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_type: Option<ValidateType>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl FlowStep {
    pub fn entity_emails(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|e| e.email.as_str())
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|e| e.id.as_str())
    }
}

/// A document moving through an approval flow, with its field overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(deserialize_with = "string_or_number")]
    pub document_id: String,
    pub contract_type: ContractType,
    pub status: Status,
    #[serde(default)]
    pub flow_steps: Vec<FlowStep>,
    #[serde(default)]
    pub mapping_data: MappingCollections,
}

impl Document {
    /// Look up a step by its (string) index
    pub fn step(&self, index: &str) -> Option<&FlowStep> {
        self.flow_steps.iter().find(|s| s.index == index)
    }

    /// Steps currently waiting for someone to act
    pub fn waiting_steps(&self) -> impl Iterator<Item = &FlowStep> {
        self.flow_steps
            .iter()
            .filter(|s| s.status == Status::Waiting)
    }
}
