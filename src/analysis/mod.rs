//! Analysis - per-record diagnosis requests, failure classes, retry of failures
//!
//! ## Architecture
//!
//! - **AnalysisResults**: session list keyed by record id (replace in place)
//! - **classify**: maps a backend failure to network/timeout/validation/server/unknown
//! - **AnalysisOrchestrator**: analyzes every record or only the failed ones
//! - **AnalysisSummary**: success vs error counts for the caller

pub mod classify;
pub mod orchestrator;
pub mod results;
pub mod summary;

pub use classify::{classify, describe};
pub use orchestrator::{AnalysisMode, AnalysisOrchestrator};
pub use results::AnalysisResults;
pub use summary::{AnalysisSummary, PassOutcome};
