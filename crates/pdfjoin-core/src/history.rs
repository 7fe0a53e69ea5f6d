//! Merge history
//!
//! Keeps the original base bytes alongside every merge applied on top of them.
//! Removing an entry replays the remaining entries, in order, against the
//! original base; nothing is ever rebuilt from an intermediate result.
//!
//! Every mutating call computes the new state in full before committing it,
//! so a failed call leaves the history exactly as it was.

use crate::error::MergeError;
use crate::merge::merge_ordered;
use crate::validation::{validate_pdf, PdfInfo};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One named input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

impl AsRef<[u8]> for SourceFile {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// A merge that was applied to the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeHistoryEntry {
    /// Position in the history; renumbered when an earlier entry is removed
    pub sequence_index: usize,
    pub source_file_names: Vec<String>,
    pub page_count_added: u32,
    /// Document bytes after this merge
    pub result_bytes: Vec<u8>,
    /// Page count after this merge
    pub page_count: u32,
    /// Inputs of this merge, kept so later removals can replay it
    pub sources: Vec<SourceFile>,
}

/// Original base plus the ordered merges applied to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeHistory {
    original: Vec<u8>,
    original_pages: u32,
    entries: Vec<MergeHistoryEntry>,
}

impl MergeHistory {
    /// Start a history from validated base bytes
    pub fn new(base: Vec<u8>) -> Result<Self, MergeError> {
        let info = inspect("base", &base)?;
        Ok(Self {
            original: base,
            original_pages: info.page_count,
            entries: Vec::new(),
        })
    }

    pub fn original(&self) -> &[u8] {
        &self.original
    }

    pub fn entries(&self) -> &[MergeHistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes of the latest successful merge, or the original when there is none
    pub fn current(&self) -> &[u8] {
        self.entries
            .last()
            .map(|e| e.result_bytes.as_slice())
            .unwrap_or(self.original.as_slice())
    }

    pub fn page_count(&self) -> u32 {
        self.entries
            .last()
            .map(|e| e.page_count)
            .unwrap_or(self.original_pages)
    }

    /// Merge `files` after the current result and record the merge
    pub fn append_to_history(
        &mut self,
        files: Vec<SourceFile>,
    ) -> Result<&MergeHistoryEntry, MergeError> {
        let entry = build_entry(self.entries.len(), self.current(), self.page_count(), files)?;

        info!(
            files = entry.source_file_names.len(),
            pages_added = entry.page_count_added,
            page_count = entry.page_count,
            "merge committed"
        );
        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Drop entry `index` and rebuild the rest from the original base
    ///
    /// Returns the removed entry.
    pub fn remove_history_entry(&mut self, index: usize) -> Result<MergeHistoryEntry, MergeError> {
        if index >= self.entries.len() {
            return Err(MergeError::HistoryIndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }

        let sources = self
            .entries
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, entry)| entry.sources.clone())
            .collect();
        let rebuilt = replay(&self.original, self.original_pages, sources)?;

        let removed = self.entries.remove(index);
        self.entries = rebuilt;

        info!(
            index,
            remaining = self.entries.len(),
            page_count = self.page_count(),
            "history entry removed"
        );
        Ok(removed)
    }

    /// Serializable form with every byte buffer base64-encoded
    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            original: STANDARD.encode(&self.original),
            entries: self
                .entries
                .iter()
                .map(|entry| {
                    entry
                        .sources
                        .iter()
                        .map(|source| SnapshotSource {
                            name: source.name.clone(),
                            data: STANDARD.encode(&source.bytes),
                        })
                        .collect()
                })
                .collect(),
        }
    }

    /// Rebuild a history from a snapshot by replaying its entries
    pub fn restore(snapshot: &HistorySnapshot) -> Result<Self, MergeError> {
        let original = decode(&snapshot.original)?;
        let mut history = Self::new(original)?;

        let sources = snapshot
            .entries
            .iter()
            .map(|entry| {
                entry
                    .iter()
                    .map(|s| Ok(SourceFile::new(s.name.clone(), decode(&s.data)?)))
                    .collect::<Result<Vec<_>, MergeError>>()
            })
            .collect::<Result<Vec<_>, MergeError>>()?;

        history.entries = replay(&history.original, history.original_pages, sources)?;
        debug!(entries = history.entries.len(), "history restored");
        Ok(history)
    }
}

/// Replay `groups` in order against `original`
fn replay(
    original: &[u8],
    original_pages: u32,
    groups: Vec<Vec<SourceFile>>,
) -> Result<Vec<MergeHistoryEntry>, MergeError> {
    let mut entries: Vec<MergeHistoryEntry> = Vec::with_capacity(groups.len());

    for files in groups {
        let (current, pages) = entries
            .last()
            .map(|e| (e.result_bytes.as_slice(), e.page_count))
            .unwrap_or((original, original_pages));
        let entry = build_entry(entries.len(), current, pages, files)?;
        entries.push(entry);
    }

    Ok(entries)
}

fn build_entry(
    sequence_index: usize,
    current: &[u8],
    current_pages: u32,
    files: Vec<SourceFile>,
) -> Result<MergeHistoryEntry, MergeError> {
    if files.is_empty() {
        return Err(MergeError::NothingToMerge);
    }

    let mut pages_added = 0;
    for file in &files {
        pages_added += inspect(&file.name, &file.bytes)?.page_count;
    }

    let output = merge_ordered(current, &files)?;
    if output.page_count != current_pages + pages_added {
        return Err(MergeError::MergeFailed(format!(
            "expected {} pages after merge, got {}",
            current_pages + pages_added,
            output.page_count
        )));
    }

    Ok(MergeHistoryEntry {
        sequence_index,
        source_file_names: files.iter().map(|f| f.name.clone()).collect(),
        page_count_added: pages_added,
        result_bytes: output.bytes,
        page_count: output.page_count,
        sources: files,
    })
}

// Inside a merge a source that does not parse is fatal for the call
fn inspect(name: &str, bytes: &[u8]) -> Result<PdfInfo, MergeError> {
    validate_pdf(name, bytes).map_err(|e| MergeError::MergeFailed(e.to_string()))
}

fn decode(data: &str) -> Result<Vec<u8>, MergeError> {
    STANDARD
        .decode(data)
        .map_err(|e| MergeError::Snapshot(format!("invalid base64: {}", e)))
}

/// A history in storable form: the original base and each entry's inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySnapshot {
    /// Base64 original bytes
    pub original: String,
    pub entries: Vec<Vec<SnapshotSource>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSource {
    pub name: String,
    /// Base64 file bytes
    pub data: String,
}
