//! Caller-side aggregate of an analysis pass

use serde::Serialize;
use std::fmt;

use super::results::AnalysisResults;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcome {
    AllSucceeded,
    Partial,
    AllFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl AnalysisSummary {
    pub fn of(results: &AnalysisResults) -> Self {
        Self {
            succeeded: results.ok_count(),
            failed: results.error_count(),
        }
    }

    pub fn outcome(&self) -> PassOutcome {
        match (self.succeeded, self.failed) {
            (_, 0) => PassOutcome::AllSucceeded,
            (0, _) => PassOutcome::AllFailed,
            _ => PassOutcome::Partial,
        }
    }
}

impl fmt::Display for AnalysisSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome() {
            PassOutcome::AllSucceeded => write!(f, "Analysis completed successfully."),
            PassOutcome::Partial => write!(
                f,
                "Analysis completed with {} errors. {} files processed successfully.",
                self.failed, self.succeeded
            ),
            PassOutcome::AllFailed => {
                write!(f, "All analyses failed. Please check the error messages.")
            }
        }
    }
}
