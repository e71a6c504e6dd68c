//! Session results list - one entry per record id, first-appearance order

use serde::Serialize;

use crate::types::{AnalysisResult, RecordId};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnalysisResults {
    entries: Vec<AnalysisResult>,
}

impl AnalysisResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entry for the same record in place, or append.
    pub fn upsert(&mut self, result: AnalysisResult) {
        match self
            .entries
            .iter_mut()
            .find(|r| r.record_id == result.record_id)
        {
            Some(existing) => *existing = result,
            None => self.entries.push(result),
        }
    }

    pub fn get(&self, record_id: &RecordId) -> Option<&AnalysisResult> {
        self.entries.iter().find(|r| &r.record_id == record_id)
    }

    pub fn position(&self, record_id: &RecordId) -> Option<usize> {
        self.entries.iter().position(|r| &r.record_id == record_id)
    }

    /// Ids whose latest result is an error, in list order.
    pub fn failed_ids(&self) -> Vec<RecordId> {
        self.entries
            .iter()
            .filter(|r| r.is_error())
            .map(|r| r.record_id.clone())
            .collect()
    }

    pub fn ok_count(&self) -> usize {
        self.entries.iter().filter(|r| !r.is_error()).count()
    }

    pub fn error_count(&self) -> usize {
        self.entries.iter().filter(|r| r.is_error()).count()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(AnalysisResult::is_error)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AnalysisResult> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[AnalysisResult] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<'a> IntoIterator for &'a AnalysisResults {
    type Item = &'a AnalysisResult;
    type IntoIter = std::slice::Iter<'a, AnalysisResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl From<AnalysisResults> for Vec<AnalysisResult> {
    fn from(results: AnalysisResults) -> Self {
        results.entries
    }
}
