use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing summarization activity.
#[derive(Default)]
pub struct SummaryMetrics {
    documents_summarized: AtomicU64,
    documents_failed: AtomicU64,
    chunks_processed: AtomicU64,
    generation_requests: AtomicU64,
}

impl SummaryMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a document that produced a final summary from `chunk_count` chunks.
    pub fn record_document(&self, chunk_count: u64) {
        self.documents_summarized.fetch_add(1, Ordering::Relaxed);
        self.chunks_processed
            .fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Record a document abandoned because of an error or cancellation.
    pub fn record_failure(&self) {
        self.documents_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one request sent to the generation service.
    pub fn record_request(&self) {
        self.generation_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_summarized: self.documents_summarized.load(Ordering::Relaxed),
            documents_failed: self.documents_failed.load(Ordering::Relaxed),
            chunks_processed: self.chunks_processed.load(Ordering::Relaxed),
            generation_requests: self.generation_requests.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of the counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents that produced a summary since startup.
    pub documents_summarized: u64,
    /// Documents that failed or were cancelled.
    pub documents_failed: u64,
    /// Chunks across all summarized documents.
    pub chunks_processed: u64,
    /// Requests issued to the generation service, including those of failed documents.
    pub generation_requests: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_documents_and_chunks() {
        let metrics = SummaryMetrics::new();
        metrics.record_document(2);
        metrics.record_document(3);
        metrics.record_failure();
        metrics.record_request();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_summarized, 2);
        assert_eq!(snapshot.chunks_processed, 5);
        assert_eq!(snapshot.documents_failed, 1);
        assert_eq!(snapshot.generation_requests, 1);
    }

    #[test]
    fn fresh_snapshot_is_zeroed() {
        assert_eq!(SummaryMetrics::new().snapshot(), MetricsSnapshot::default());
    }
}
