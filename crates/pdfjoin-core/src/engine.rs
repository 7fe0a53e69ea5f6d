//! Async merge engine
//!
//! Owns a [`MergeHistory`] behind a `tokio` mutex held for the whole of each
//! merge, so merges on one engine run strictly one after another. The lopdf
//! work runs on the blocking pool against a copy of the history; the copy is
//! swapped in only when the merge succeeds.

use crate::error::MergeError;
use crate::history::{HistorySnapshot, MergeHistory, SourceFile};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument, warn};

/// What to do when a merge is requested while another is running
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusyPolicy {
    /// Fail fast with [`MergeError::Busy`]
    #[default]
    Reject,
    /// Wait for the running merge to finish
    Queue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    #[serde(default)]
    pub busy_policy: BusyPolicy,
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,
}

fn default_max_sources() -> usize {
    50
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            busy_policy: BusyPolicy::default(),
            max_sources: default_max_sources(),
        }
    }
}

/// Progress of one engine call, `current` out of `total`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeProgress {
    pub current: u32,
    pub total: u32,
    pub message: String,
}

impl MergeProgress {
    fn new(current: u32, message: impl Into<String>) -> Self {
        Self {
            current,
            total: 100,
            message: message.into(),
        }
    }
}

/// State of the document after an engine call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    pub page_count: u32,
    pub history_len: usize,
}

/// One history entry without its bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySummary {
    pub sequence_index: usize,
    pub source_file_names: Vec<String>,
    pub page_count_added: u32,
    pub page_count: u32,
}

pub struct MergeEngine {
    history: Mutex<MergeHistory>,
    options: EngineOptions,
}

impl MergeEngine {
    pub fn new(base: Vec<u8>, options: EngineOptions) -> Result<Self, MergeError> {
        Ok(Self {
            history: Mutex::new(MergeHistory::new(base)?),
            options,
        })
    }

    /// Rebuild an engine from a stored snapshot
    pub async fn restore(
        snapshot: HistorySnapshot,
        options: EngineOptions,
    ) -> Result<Self, MergeError> {
        let history = run_blocking(move || MergeHistory::restore(&snapshot)).await?;
        debug!(entries = history.len(), "engine restored");
        Ok(Self {
            history: Mutex::new(history),
            options,
        })
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    pub async fn append(&self, files: Vec<SourceFile>) -> Result<MergeSummary, MergeError> {
        self.append_with_progress(files, |_| {}).await
    }

    /// Merge `files` after the current result, reporting progress to `progress`
    #[instrument(skip(self, files, progress), fields(files = files.len()))]
    pub async fn append_with_progress<F>(
        &self,
        files: Vec<SourceFile>,
        mut progress: F,
    ) -> Result<MergeSummary, MergeError>
    where
        F: FnMut(MergeProgress),
    {
        if files.is_empty() {
            return Err(MergeError::NothingToMerge);
        }
        if files.len() > self.options.max_sources {
            return Err(MergeError::TooManySources {
                count: files.len(),
                max: self.options.max_sources,
            });
        }

        let mut guard = self.acquire().await?;
        progress(MergeProgress::new(5, "Preparing documents..."));

        let total = files.len();
        for (i, file) in files.iter().enumerate() {
            progress(MergeProgress::new(
                5 + (i * 80 / total) as u32,
                format!("Processing document {}/{} ({})...", i + 1, total, file.name),
            ));
        }

        progress(MergeProgress::new(85, "Merging..."));
        let mut next = (*guard).clone();
        let next = run_blocking(move || {
            next.append_to_history(files)?;
            Ok(next)
        })
        .await?;

        *guard = next;
        progress(MergeProgress::new(100, "Complete"));
        Ok(summary(&guard))
    }

    /// Remove history entry `index`, rebuilding from the original base
    #[instrument(skip(self))]
    pub async fn remove(&self, index: usize) -> Result<MergeSummary, MergeError> {
        let mut guard = self.acquire().await?;

        let mut next = (*guard).clone();
        let next = run_blocking(move || {
            next.remove_history_entry(index)?;
            Ok(next)
        })
        .await?;

        *guard = next;
        Ok(summary(&guard))
    }

    /// Latest merged bytes (the original base when nothing is merged yet)
    pub async fn current(&self) -> Vec<u8> {
        self.history.lock().await.current().to_vec()
    }

    pub async fn page_count(&self) -> u32 {
        self.history.lock().await.page_count()
    }

    pub async fn entries(&self) -> Vec<EntrySummary> {
        self.history
            .lock()
            .await
            .entries()
            .iter()
            .map(|entry| EntrySummary {
                sequence_index: entry.sequence_index,
                source_file_names: entry.source_file_names.clone(),
                page_count_added: entry.page_count_added,
                page_count: entry.page_count,
            })
            .collect()
    }

    pub async fn snapshot(&self) -> HistorySnapshot {
        self.history.lock().await.snapshot()
    }

    async fn acquire(&self) -> Result<MutexGuard<'_, MergeHistory>, MergeError> {
        match self.options.busy_policy {
            BusyPolicy::Reject => self.history.try_lock().map_err(|_| {
                warn!("merge rejected, another merge is in progress");
                MergeError::Busy
            }),
            BusyPolicy::Queue => Ok(self.history.lock().await),
        }
    }
}

fn summary(history: &MergeHistory) -> MergeSummary {
    MergeSummary {
        page_count: history.page_count(),
        history_len: history.len(),
    }
}

async fn run_blocking<T, F>(work: F) -> Result<T, MergeError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, MergeError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| MergeError::MergeFailed(format!("Merge task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::test_support::{create_test_pdf, labels, page_labels};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn engine(base_pages: u32, policy: BusyPolicy) -> MergeEngine {
        MergeEngine::new(
            create_test_pdf(base_pages, "Base"),
            EngineOptions {
                busy_policy: policy,
                ..EngineOptions::default()
            },
        )
        .unwrap()
    }

    fn file(name: &str, pages: u32) -> SourceFile {
        SourceFile::new(format!("{}.pdf", name), create_test_pdf(pages, name))
    }

    #[tokio::test]
    async fn test_summaries_serialize_camel_case() {
        let engine = engine(1, BusyPolicy::Reject);
        let summary = engine.append(vec![file("A", 2)]).await.unwrap();

        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            serde_json::json!({"pageCount": 3, "historyLen": 1})
        );
        assert_eq!(
            serde_json::to_value(engine.entries().await).unwrap(),
            serde_json::json!([{
                "sequenceIndex": 0,
                "sourceFileNames": ["A.pdf"],
                "pageCountAdded": 2,
                "pageCount": 3
            }])
        );
    }

    #[tokio::test]
    async fn test_append_then_remove_first() {
        let engine = engine(10, BusyPolicy::Reject);

        let summary = engine.append(vec![file("A", 3)]).await.unwrap();
        assert_eq!(summary, MergeSummary { page_count: 13, history_len: 1 });

        let summary = engine.append(vec![file("B", 2)]).await.unwrap();
        assert_eq!(summary.page_count, 15);

        let summary = engine.remove(0).await.unwrap();
        assert_eq!(summary, MergeSummary { page_count: 12, history_len: 1 });
        assert_eq!(
            page_labels(&engine.current().await),
            [labels("Base", 10), labels("B", 2)].concat()
        );
    }

    #[tokio::test]
    async fn test_progress_is_reported_in_order() {
        let engine = engine(1, BusyPolicy::Reject);
        let mut seen = Vec::new();

        engine
            .append_with_progress(vec![file("A", 1), file("B", 1)], |p| seen.push(p))
            .await
            .unwrap();

        let currents: Vec<u32> = seen.iter().map(|p| p.current).collect();
        assert_eq!(currents, vec![5, 5, 45, 85, 100]);
        assert!(seen.iter().all(|p| p.total == 100));
        assert_eq!(seen[2].message, "Processing document 2/2 (B.pdf)...");
        assert_eq!(seen.last().unwrap().message, "Complete");
    }

    #[tokio::test]
    async fn test_failed_merge_keeps_last_good_state() {
        let engine = engine(2, BusyPolicy::Reject);
        engine.append(vec![file("A", 1)]).await.unwrap();
        let before = engine.current().await;

        let err = engine
            .append(vec![SourceFile::new("broken.pdf", b"%PDF-1.7 nope".to_vec())])
            .await
            .unwrap_err();
        assert!(matches!(err, MergeError::MergeFailed(ref msg) if msg.contains("broken.pdf")));
        assert_eq!(engine.current().await, before);
        assert_eq!(engine.page_count().await, 3);
    }

    #[tokio::test]
    async fn test_empty_and_oversized_requests() {
        let engine = MergeEngine::new(
            create_test_pdf(1, "Base"),
            EngineOptions {
                max_sources: 1,
                ..EngineOptions::default()
            },
        )
        .unwrap();

        assert_eq!(engine.append(vec![]).await.unwrap_err(), MergeError::NothingToMerge);
        assert_eq!(
            engine
                .append(vec![file("A", 1), file("B", 1)])
                .await
                .unwrap_err(),
            MergeError::TooManySources { count: 2, max: 1 }
        );
    }

    #[tokio::test]
    async fn test_remove_out_of_range() {
        let engine = engine(1, BusyPolicy::Reject);
        assert_eq!(
            engine.remove(0).await.unwrap_err(),
            MergeError::HistoryIndexOutOfRange { index: 0, len: 0 }
        );
    }

    #[tokio::test]
    async fn test_reject_policy_fails_while_busy() {
        let engine = engine(1, BusyPolicy::Reject);

        // Hold the lock the way an in-flight merge would
        let guard = engine.history.lock().await;
        let err = engine.append(vec![file("A", 1)]).await.unwrap_err();
        assert_eq!(err, MergeError::Busy);
        drop(guard);

        engine.append(vec![file("A", 1)]).await.unwrap();
        assert_eq!(engine.page_count().await, 2);
    }

    #[tokio::test]
    async fn test_queue_policy_waits_for_running_merge() {
        let engine = Arc::new(engine(1, BusyPolicy::Queue));

        let guard = engine.history.lock().await;
        let waiting = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.append(vec![file("A", 2)]).await })
        };
        tokio::task::yield_now().await;
        assert!(!waiting.is_finished());
        drop(guard);

        let summary = waiting.await.unwrap().unwrap();
        assert_eq!(summary.page_count, 3);
    }

    #[tokio::test]
    async fn test_concurrent_queued_merges_all_commit() {
        let engine = Arc::new(engine(1, BusyPolicy::Queue));

        let tasks: Vec<_> = (0..4)
            .map(|i| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move { engine.append(vec![file(&format!("F{}", i), 1)]).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(engine.page_count().await, 5);
        assert_eq!(engine.entries().await.len(), 4);
    }

    #[tokio::test]
    async fn test_snapshot_and_restore() {
        let engine = engine(2, BusyPolicy::Reject);
        engine.append(vec![file("A", 1)]).await.unwrap();
        engine.append(vec![file("B", 3)]).await.unwrap();

        let snapshot = engine.snapshot().await;
        let restored = MergeEngine::restore(snapshot, engine.options()).await.unwrap();

        assert_eq!(restored.page_count().await, 6);
        assert_eq!(restored.entries().await, engine.entries().await);
        assert_eq!(
            page_labels(&restored.current().await),
            [labels("Base", 2), labels("A", 1), labels("B", 3)].concat()
        );
    }
}
