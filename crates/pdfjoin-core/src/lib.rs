//! Ordered PDF merge with replayable history
//!
//! - [`merge_ordered`]: base pages first, then each additional file in order
//! - [`MergeHistory`]: merges applied on top of a retained original base
//! - [`MergeEngine`]: async, one merge at a time, with progress reporting

pub mod engine;
pub mod error;
pub mod history;
pub mod merge;
pub mod validation;

pub use engine::{
    BusyPolicy, EngineOptions, EntrySummary, MergeEngine, MergeProgress, MergeSummary,
};
pub use error::MergeError;
pub use history::{HistorySnapshot, MergeHistory, MergeHistoryEntry, SnapshotSource, SourceFile};
pub use merge::{merge_ordered, MergeOutput};
pub use validation::{validate_pdf, PdfInfo};
