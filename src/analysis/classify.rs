//! Failure classification for analysis attempts
//!
//! | Signal                         | Class        |
//! |--------------------------------|--------------|
//! | transport / fetch failure      | `network`    |
//! | request timeout                | `timeout`    |
//! | HTTP 4xx                       | `validation` |
//! | HTTP 5xx                       | `server`     |
//! | anything else                  | `unknown`    |

use crate::backend::BackendError;
use crate::types::AnalysisErrorKind;

pub fn classify(error: &BackendError) -> AnalysisErrorKind {
    match error {
        BackendError::Network(_) => AnalysisErrorKind::Network,
        BackendError::Timeout(_) => AnalysisErrorKind::Timeout,
        BackendError::Status { status, .. } => match status {
            400..=499 => AnalysisErrorKind::Validation,
            500..=599 => AnalysisErrorKind::Server,
            _ => AnalysisErrorKind::Unknown,
        },
        BackendError::Decode(_) | BackendError::Rejected(_) => AnalysisErrorKind::Unknown,
    }
}

/// Class plus the message shown for it. Unclassified failures keep the
/// underlying error text.
pub fn describe(error: &BackendError) -> (AnalysisErrorKind, String) {
    let kind = classify(error);
    let message = kind
        .user_message()
        .map_or_else(|| error.to_string(), str::to_string);
    (kind, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> BackendError {
        BackendError::Status {
            status: code,
            detail: String::new(),
        }
    }

    #[test]
    fn status_codes_split_by_class() {
        assert_eq!(classify(&status(400)), AnalysisErrorKind::Validation);
        assert_eq!(classify(&status(422)), AnalysisErrorKind::Validation);
        assert_eq!(classify(&status(500)), AnalysisErrorKind::Server);
        assert_eq!(classify(&status(503)), AnalysisErrorKind::Server);
        assert_eq!(classify(&status(302)), AnalysisErrorKind::Unknown);
    }

    #[test]
    fn transport_failures() {
        assert_eq!(
            classify(&BackendError::Network("connection refused".into())),
            AnalysisErrorKind::Network
        );
        assert_eq!(
            classify(&BackendError::Timeout("30s elapsed".into())),
            AnalysisErrorKind::Timeout
        );
    }

    #[test]
    fn server_error_message_says_so() {
        let (kind, message) = describe(&status(500));
        assert_eq!(kind, AnalysisErrorKind::Server);
        assert!(message.contains("Server error"));
    }

    #[test]
    fn unknown_keeps_underlying_message() {
        let (kind, message) = describe(&BackendError::Rejected("Vibration record r9 not found".into()));
        assert_eq!(kind, AnalysisErrorKind::Unknown);
        assert_eq!(message, "Vibration record r9 not found");
    }
}
