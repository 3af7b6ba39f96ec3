//! Background suggestion computation.
//!
//! Requests carry a generation number. Issuing a new request (or calling
//! [`SuggestionWorker::cancel`]) bumps the current generation; the worker
//! skips queued requests that are no longer current, and the receiving side
//! drops any result whose generation does not match. The last request issued
//! is therefore the only one whose result can ever be observed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::engine::{SuggestContext, Suggestion, SuggestionEngine};
use crate::error::Result;

struct Request {
    generation: u64,
    context: SuggestContext,
}

/// Result of one background request.
#[derive(Debug)]
pub struct SuggestionBatch {
    pub generation: u64,
    pub result: Result<Vec<Suggestion>>,
}

pub struct SuggestionWorker {
    requests: Option<mpsc::Sender<Request>>,
    results: mpsc::Receiver<SuggestionBatch>,
    generation: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl SuggestionWorker {
    /// Start the worker thread.
    pub fn spawn(engine: SuggestionEngine) -> std::io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<Request>();
        let (result_tx, result_rx) = mpsc::channel();
        let generation = Arc::new(AtomicU64::new(0));
        let current = Arc::clone(&generation);

        let handle = std::thread::Builder::new()
            .name("isegrid-suggest".to_string())
            .spawn(move || {
                while let Ok(mut request) = request_rx.recv() {
                    // Coalesce: only the newest queued request matters.
                    while let Ok(newer) = request_rx.try_recv() {
                        request = newer;
                    }
                    if request.generation != current.load(Ordering::Acquire) {
                        continue;
                    }
                    let result = engine
                        .suggest(&request.context)
                        .map(|suggestions| suggestions.collect());
                    if request.generation != current.load(Ordering::Acquire) {
                        continue;
                    }
                    let batch = SuggestionBatch {
                        generation: request.generation,
                        result,
                    };
                    if result_tx.send(batch).is_err() {
                        break;
                    }
                }
            })?;

        Ok(SuggestionWorker {
            requests: Some(request_tx),
            results: result_rx,
            generation,
            handle: Some(handle),
        })
    }

    /// Queue a request, superseding every earlier one. Returns its generation.
    pub fn request(&self, context: SuggestContext) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        if let Some(tx) = &self.requests
            && tx.send(Request { generation, context }).is_err()
        {
            warn!("suggestion worker is gone; request dropped");
        }
        generation
    }

    /// Invalidate every outstanding request.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Latest result for the current generation, if one has arrived.
    pub fn try_recv(&self) -> Option<SuggestionBatch> {
        let mut latest = None;
        while let Ok(batch) = self.results.try_recv() {
            latest = self.keep_current(batch).or(latest);
        }
        latest
    }

    /// Wait up to `timeout` for the result of the current generation.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<SuggestionBatch> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let batch = self.results.recv_timeout(remaining).ok()?;
            if let Some(batch) = self.keep_current(batch) {
                return Some(batch);
            }
        }
    }

    fn keep_current(&self, batch: SuggestionBatch) -> Option<SuggestionBatch> {
        if batch.generation == self.current_generation() {
            Some(batch)
        } else {
            debug!(
                generation = batch.generation,
                current = self.current_generation(),
                "discarding stale suggestions"
            );
            None
        }
    }
}

impl Drop for SuggestionWorker {
    fn drop(&mut self) {
        self.cancel();
        // Closing the request channel ends the worker loop.
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::{Symbol, SymbolCatalog, SymbolKind};
    use isegrid_model::{Address, SheetId};

    fn worker() -> SuggestionWorker {
        let mut catalog = SymbolCatalog::new();
        for name in ["SUM", "SUMIF", "AVG"] {
            catalog.add(Symbol::new(name, SymbolKind::Function));
        }
        SuggestionWorker::spawn(SuggestionEngine::new(catalog)).unwrap()
    }

    fn context(draft: &str) -> SuggestContext {
        SuggestContext {
            draft: draft.to_string(),
            caret: draft.chars().count(),
            address: Address::new(SheetId(0), 0, 0),
            nearby: Vec::new(),
        }
    }

    #[test]
    fn test_latest_request_wins() {
        let worker = worker();
        worker.request(context("a"));
        worker.request(context("su"));
        let latest = worker.request(context("sumi"));

        let batch = worker.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(batch.generation, latest);
        let labels: Vec<_> = batch.result.unwrap().into_iter().map(|s| s.label).collect();
        assert_eq!(labels, vec!["SUMIF"]);
    }

    #[test]
    fn test_cancel_discards_in_flight_result() {
        let worker = worker();
        worker.request(context("su"));
        worker.cancel();
        assert!(worker.recv_timeout(Duration::from_millis(200)).is_none());
    }

    #[test]
    fn test_invalid_context_is_reported() {
        let worker = worker();
        let mut ctx = context("su");
        ctx.caret = 9;
        worker.request(ctx);
        let batch = worker.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(batch.result.is_err());
    }
}
