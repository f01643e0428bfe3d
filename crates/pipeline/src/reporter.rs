//! Result reporter: submit evaluations to the compliance aggregator.

use tracing::{error, info, warn};

use confcheck_core::{Evaluation, PipelineError, PipelineSettings, ReportOutcome};

use crate::services::{ComplianceAggregator, PutEvaluationsRequest};

/// Submit the batch in a single call and interpret the response.
///
/// A failed call is [`PipelineError::ReportSubmissionFailed`]; a call whose
/// response lists rejected evaluations is [`PipelineError::PartialReportFailure`].
pub async fn report(
    aggregator: &dyn ComplianceAggregator,
    evaluations: Vec<Evaluation>,
    result_token: &str,
    settings: &PipelineSettings,
) -> Result<ReportOutcome, PipelineError> {
    let submitted = evaluations.len();
    let test_mode = settings.is_test_mode(result_token);

    let request = PutEvaluationsRequest {
        evaluations,
        result_token: result_token.to_string(),
        test_mode,
    };

    let response = aggregator.put_evaluations(request).await.map_err(|e| {
        error!(error = %e, submitted, "Evaluation submission failed");
        PipelineError::ReportSubmissionFailed(e)
    })?;

    let outcome = ReportOutcome {
        accepted_count: submitted.saturating_sub(response.failed_evaluations.len()),
        failed_evaluations: response.failed_evaluations,
    };

    if !outcome.is_complete() {
        warn!(
            submitted,
            accepted = outcome.accepted_count,
            failed = outcome.failed_evaluations.len(),
            "Aggregator rejected part of the batch"
        );
        return Err(PipelineError::PartialReportFailure { outcome });
    }

    info!(submitted, test_mode, "Evaluations reported");
    Ok(outcome)
}
