//! Analysis Orchestrator - runs the analysis backend over created records
//!
//! Every candidate record is attempted; a failure becomes an `error` result
//! for that record and the batch continues. Results are keyed by record id:
//! a later attempt for the same id replaces the earlier entry in place, so the
//! session list holds exactly one entry per record ever analyzed.

use chrono::Utc;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::classify::describe;
use super::results::AnalysisResults;
use crate::backend::AnalysisBackend;
use crate::types::{AnalysisResult, RecordId};
use crate::worker::WorkQueue;

/// Which records an analysis pass covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Every given record, whether or not it was analyzed before
    All,
    /// Only given records whose current result is an error
    RetryFailed,
}

#[derive(Debug, Default)]
struct Ledger {
    results: AnalysisResults,
    in_flight: BTreeSet<RecordId>,
    generation: u64,
}

pub struct AnalysisOrchestrator<A> {
    backend: Arc<A>,
    ledger: Arc<RwLock<Ledger>>,
    queue: WorkQueue,
}

impl<A: AnalysisBackend> AnalysisOrchestrator<A> {
    pub fn new(backend: Arc<A>) -> Self {
        Self {
            backend,
            ledger: Arc::new(RwLock::new(Ledger::default())),
            queue: WorkQueue::sequential(),
        }
    }

    /// Use a different queue (e.g. bounded parallel analysis).
    pub fn with_queue(mut self, queue: WorkQueue) -> Self {
        self.queue = queue;
        self
    }

    /// Current results list.
    pub async fn results(&self) -> AnalysisResults {
        self.ledger.read().await.results.clone()
    }

    /// Records whose analysis request is outstanding.
    pub async fn in_flight(&self) -> BTreeSet<RecordId> {
        self.ledger.read().await.in_flight.clone()
    }

    /// Discard all results. Outstanding requests still finish but their
    /// results are dropped.
    pub async fn reset(&self) {
        let mut ledger = self.ledger.write().await;
        ledger.results.clear();
        ledger.in_flight.clear();
        ledger.generation = ledger.generation.wrapping_add(1);
    }

    /// Analyze the candidates `mode` selects from `record_ids` and return the
    /// updated session list.
    pub async fn analyze(&self, record_ids: &[RecordId], mode: AnalysisMode) -> Vec<AnalysisResult> {
        let (candidates, generation) = {
            let mut ledger = self.ledger.write().await;
            let candidates = select_candidates(record_ids, &ledger.results, mode);
            ledger.in_flight.extend(candidates.iter().cloned());
            (candidates, ledger.generation)
        };

        if candidates.is_empty() {
            info!(?mode, "No records to analyze");
            return self.results().await.into();
        }

        info!(records = candidates.len(), ?mode, limit = self.queue.limit(), "Starting analysis");

        // Recorded in candidate order so new ids append by first appearance
        self.queue
            .run_each(
                candidates,
                |record_id| self.analyze_one(record_id),
                |result| self.record(generation, result),
            )
            .await;

        let results = self.results().await;
        info!(
            ok = results.ok_count(),
            errors = results.error_count(),
            "Analysis pass finished"
        );
        results.into()
    }

    /// Re-attempt every record whose current result is an error.
    pub async fn retry_failed(&self) -> Vec<AnalysisResult> {
        let failed = self.ledger.read().await.results.failed_ids();
        self.analyze(&failed, AnalysisMode::RetryFailed).await
    }

    async fn analyze_one(&self, record_id: RecordId) -> AnalysisResult {
        debug!(record_id = %record_id, "Analyzing record");
        match self.backend.analyze_record(&record_id).await {
            Ok(analyzed) => {
                info!(
                    record_id = %record_id,
                    health_score = ?analyzed.diagnosis.health_score,
                    faults = analyzed.diagnosis.faults().len(),
                    "Analysis complete"
                );
                let timestamp = analyzed.analyzed_at.unwrap_or_else(Utc::now);
                AnalysisResult::ok(record_id, timestamp, analyzed.diagnosis)
            }
            Err(e) => {
                let (kind, message) = describe(&e);
                warn!(record_id = %record_id, error = %e, kind = %kind, "Analysis failed");
                AnalysisResult::error(record_id, Utc::now(), kind, message)
            }
        }
    }

    async fn record(&self, generation: u64, result: AnalysisResult) {
        let mut ledger = self.ledger.write().await;
        if ledger.generation != generation {
            debug!(record_id = %result.record_id, "Session reset while in flight, dropping result");
            return;
        }
        ledger.in_flight.remove(&result.record_id);
        ledger.results.upsert(result);
    }
}

fn select_candidates(
    record_ids: &[RecordId],
    prior: &AnalysisResults,
    mode: AnalysisMode,
) -> Vec<RecordId> {
    let mut seen = HashSet::new();
    record_ids
        .iter()
        .filter(|id| seen.insert(*id))
        .filter(|id| match mode {
            AnalysisMode::All => true,
            AnalysisMode::RetryFailed => prior.get(id).is_some_and(AnalysisResult::is_error),
        })
        .cloned()
        .collect()
}
