//! Document signing core logic
//!
//! Given a workflow document and the acting party, this crate works out which
//! flow steps are waiting on that party, how the document should be shown,
//! and which positioned fields to render.
//!
//! - [`actor`]: step resolution per contract type
//! - [`flow`]: status classification and unlock gates
//! - [`projector`]: `mappingData` to rendering-ready fields
//! - [`view`]: all of the above in one call

pub mod actor;
pub mod error;
pub mod flow;
pub mod projector;
pub mod view;

pub use actor::{resolve, resolve_with, ResolverOptions};
pub use error::ProjectionIssue;
pub use flow::{
    classify, is_sender_step, requires_validation, unlock_gates, view_mode, FlowState,
    UnlockGate, ValidationRequirement, ViewMode,
};
pub use projector::{leaf_count, normalize, project, project_with_report, render, Projection};
pub use view::{prepare_view, SigningView};

// Callers handle documents and identities through this crate alone
pub use shared_types::{ActorDescriptor, Document, Identity, MappingCollections, ProjectedField};
