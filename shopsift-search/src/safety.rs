//! Fail-closed safety gate around the external classifier.
//!
//! The sanitized query is wrapped in explicit delimiter tags before it is
//! handed to the classifier. Because sanitized text can never contain a
//! markup tag, user content cannot forge the closing delimiter.

use std::time::Duration;

use crate::capability::QuerySafetyClassifier;
use crate::sanitize::SanitizedQuery;
use crate::types::SafetyVerdict;

/// Opening delimiter placed before user content.
pub const QUERY_OPEN_TAG: &str = "<user_query>";

/// Closing delimiter placed after user content.
pub const QUERY_CLOSE_TAG: &str = "</user_query>";

/// Reason returned when the classifier cannot produce a verdict. The
/// underlying error is logged, never returned.
pub const CLASSIFIER_UNAVAILABLE_REASON: &str = "safety check unavailable; query rejected";

/// Reason used when the classifier rejects without explaining why.
pub const UNSPECIFIED_REJECTION_REASON: &str = "query rejected by safety check";

/// Wrap sanitized text in the user-content delimiters.
pub fn delimit(query: &SanitizedQuery) -> String {
    format!("{QUERY_OPEN_TAG}\n{}\n{QUERY_CLOSE_TAG}", query.as_str())
}

/// Ask `classifier` for a verdict on `query`, failing closed.
///
/// Any classifier error, or a call that outlives `timeout`, yields a
/// rejection carrying [`CLASSIFIER_UNAVAILABLE_REASON`]. A rejection
/// without a reason is given [`UNSPECIFIED_REJECTION_REASON`]. This
/// function never returns an accepting verdict unless the classifier did.
pub async fn classify(
    classifier: &dyn QuerySafetyClassifier,
    query: &SanitizedQuery,
    timeout: Duration,
) -> SafetyVerdict {
    let text = delimit(query);
    match tokio::time::timeout(timeout, classifier.classify(&text)).await {
        Ok(Ok(verdict)) if verdict.is_safe => verdict,
        Ok(Ok(verdict)) => {
            let reason = verdict
                .reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| UNSPECIFIED_REJECTION_REASON.to_owned());
            SafetyVerdict::rejected(reason)
        }
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "safety classifier failed; rejecting query");
            SafetyVerdict::rejected(CLASSIFIER_UNAVAILABLE_REASON)
        }
        Err(_) => {
            tracing::warn!(
                timeout_secs = timeout.as_secs(),
                "safety classifier timed out; rejecting query"
            );
            SafetyVerdict::rejected(CLASSIFIER_UNAVAILABLE_REASON)
        }
    }
}
