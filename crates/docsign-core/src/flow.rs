//! Approval flow classification
//!
//! Status codes are owned by the workflow service; nothing here computes a
//! transition. The functions only classify what they are given so callers can
//! pick a read-only or editable view and know which verification a step
//! demands before its fields unlock.

use serde::{Deserialize, Serialize};
use shared_types::{Document, EntityType, FlowStep, Status, ValidateType};
use std::collections::BTreeSet;

/// Coarse lifecycle tag derived from a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowState {
    /// Still being prepared by the sender (`D`)
    Draft,
    /// Out for action (`W`, `N`)
    Active,
    /// Stopped before completion (`R`, `C`)
    Terminated,
    /// Every step done (`Y`)
    Completed,
}

pub fn classify(status: Status) -> FlowState {
    match status {
        Status::Draft => FlowState::Draft,
        Status::Waiting | Status::InProgress => FlowState::Active,
        Status::Rejected | Status::Canceled => FlowState::Terminated,
        Status::Completed => FlowState::Completed,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    Editable,
    ReadOnly,
}

/// Editable only while the document is active and the actor has a step to act on
pub fn view_mode(document: &Document, active: &BTreeSet<String>) -> ViewMode {
    if classify(document.status) == FlowState::Active && !active.is_empty() {
        ViewMode::Editable
    } else {
        ViewMode::ReadOnly
    }
}

/// Verification an actor must pass before a step's fields unlock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationRequirement {
    Otp,
    Password,
    None,
}

impl ValidationRequirement {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationRequirement::Otp => "otp",
            ValidationRequirement::Password => "password",
            ValidationRequirement::None => "none",
        }
    }
}

pub fn requires_validation(step: &FlowStep) -> ValidationRequirement {
    match step.validate_type {
        Some(ValidateType::Otp) => ValidationRequirement::Otp,
        Some(ValidateType::Password) => ValidationRequirement::Password,
        None => ValidationRequirement::None,
    }
}

pub fn is_sender_step(step: &FlowStep) -> bool {
    step.type_entity == EntityType::Sender
}

/// The verification standing between an actor and one of their active steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockGate {
    pub step_index: String,
    pub requirement: ValidationRequirement,
    pub sender_step: bool,
}

/// Gates for every active step, in flow order
pub fn unlock_gates(document: &Document, active: &BTreeSet<String>) -> Vec<UnlockGate> {
    document
        .flow_steps
        .iter()
        .filter(|step| active.contains(&step.index))
        .map(|step| UnlockGate {
            step_index: step.index.clone(),
            requirement: requires_validation(step),
            sender_step: is_sender_step(step),
        })
        .collect()
}
