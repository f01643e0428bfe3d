use thiserror::Error;

use crate::evaluation::ReportOutcome;

/// Failure of a call to one of the external collaborators
/// (configuration history lookup or evaluation submission).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{operation} failed: {message}")]
pub struct ServiceError {
    pub operation: &'static str,
    pub message: String,
}

impl ServiceError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Every way a single invocation of the pipeline can fail.
///
/// None of these are retried inside the pipeline; they surface to the
/// hosting platform, which owns retry and alerting.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// An inbound blob could not be decoded, or a required envelope field is missing.
    #[error("Invalid inbound event: {0}")]
    InvalidEvent(String),

    #[error("Events with the message type '{message_type}' are not evaluated by this rule")]
    IncompatibleMessageType { message_type: String },

    #[error("Malformed configuration snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("Failed to fetch configuration of {resource_type} {resource_id}: {reason}")]
    SnapshotFetchFailed {
        resource_type: String,
        resource_id: String,
        reason: String,
    },

    /// The rule itself failed. The rule's error is kept verbatim as the source.
    #[error("Rule '{rule}' failed: {source}")]
    RuleInvocationFailed {
        rule: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Evaluation report submission failed: {0}")]
    ReportSubmissionFailed(#[source] ServiceError),

    /// The submission went through but the aggregator rejected part of the batch.
    #[error(
        "{} evaluation(s) were not accepted by the aggregator ({} accepted)",
        .outcome.failed_evaluations.len(),
        .outcome.accepted_count
    )]
    PartialReportFailure { outcome: ReportOutcome },
}

impl PipelineError {
    /// Short machine-friendly name of the error kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::InvalidEvent(_) => "invalid_event",
            PipelineError::IncompatibleMessageType { .. } => "incompatible_message_type",
            PipelineError::MalformedSnapshot(_) => "malformed_snapshot",
            PipelineError::SnapshotFetchFailed { .. } => "snapshot_fetch_failed",
            PipelineError::RuleInvocationFailed { .. } => "rule_invocation_failed",
            PipelineError::ReportSubmissionFailed(_) => "report_submission_failed",
            PipelineError::PartialReportFailure { .. } => "partial_report_failure",
        }
    }
}
