use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("Merge failed: {0}")]
    MergeFailed(String),

    /// From `validate_pdf`; merges report the same failure as `MergeFailed`
    #[error("Invalid source '{name}': {reason}")]
    InvalidSource { name: String, reason: String },

    #[error("A merge is already in progress")]
    Busy,

    #[error("History entry {index} out of range ({len} entries)")]
    HistoryIndexOutOfRange { index: usize, len: usize },

    #[error("No files to merge")]
    NothingToMerge,

    #[error("Too many files in one merge: {count} (limit {max})")]
    TooManySources { count: usize, max: usize },

    #[error("Invalid history snapshot: {0}")]
    Snapshot(String),
}
