use serde::Serialize;
use shared_types::CollectionKind;
use thiserror::Error;

/// A non-fatal problem found while projecting fields
///
/// Projection never aborts; each issue names the entry that was left out.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProjectionIssue {
    #[error("skipped {collection} entry {index}{}: {reason}", element_suffix(.element))]
    #[serde(rename_all = "camelCase")]
    ValidationSkipped {
        collection: CollectionKind,
        index: usize,
        element: Option<usize>,
        reason: String,
    },
}

fn element_suffix(element: &Option<usize>) -> String {
    element
        .map(|e| format!(" element {}", e))
        .unwrap_or_default()
}
