//! One-call preparation of a signing view
//!
//! Composes actor resolution, flow classification and field projection for a
//! single document and actor.

use crate::actor::{resolve_with, ResolverOptions};
use crate::error::ProjectionIssue;
use crate::flow::{classify, unlock_gates, view_mode, FlowState, UnlockGate, ViewMode};
use crate::projector::project_with_report;
use serde::Serialize;
use shared_types::{Document, Identity, ProjectedField};
use std::collections::BTreeSet;
use tracing::info;

/// Everything a renderer needs to show `document` to one actor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningView {
    pub document_id: String,
    pub active_steps: BTreeSet<String>,
    pub flow_state: FlowState,
    pub view_mode: ViewMode,
    pub gates: Vec<UnlockGate>,
    pub fields: Vec<ProjectedField>,
    pub skipped: Vec<ProjectionIssue>,
}

impl SigningView {
    pub fn is_editable(&self) -> bool {
        self.view_mode == ViewMode::Editable
    }
}

pub fn prepare_view(
    document: &Document,
    identity: &Identity,
    options: ResolverOptions,
) -> SigningView {
    let active_steps = resolve_with(document, identity, options);
    let projection = project_with_report(&document.mapping_data, &active_steps);
    let view_mode = view_mode(document, &active_steps);

    info!(
        document_id = %document.document_id,
        status = %document.status,
        steps = active_steps.len(),
        fields = projection.fields.len(),
        skipped = projection.skipped.len(),
        "prepared signing view"
    );

    SigningView {
        document_id: document.document_id.clone(),
        gates: unlock_gates(document, &active_steps),
        flow_state: classify(document.status),
        view_mode,
        fields: projection.fields,
        skipped: projection.skipped,
        active_steps,
    }
}
