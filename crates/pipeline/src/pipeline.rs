//! Pipeline orchestrator: runs one invocation end to end.

use serde::Serialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use confcheck_core::{
    Evaluation, EvaluationSubject, InboundEvent, MessageKind, PipelineError, PipelineSettings,
    ReportOutcome, Verdict,
};

use crate::applicability::{check_applicability, Applicability};
use crate::builder::{build_evaluations, BuiltEvaluations, DroppedBundle};
use crate::normalizer::normalize;
use crate::reporter::report;
use crate::resolver::resolve_snapshot;
use crate::rule::{invoke_rule, ConfigRule};
use crate::services::Collaborators;

/// What a successful invocation did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvocationOutcome {
    /// No resource context and nothing to evaluate; no submission was made.
    NothingToReport { message_kind: MessageKind },
    Reported(InvocationReport),
}

/// Details of a completed submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationReport {
    pub message_kind: MessageKind,
    pub rule_invoked: bool,
    pub evaluations: Vec<Evaluation>,
    pub outcome: ReportOutcome,
    /// Multi-result entries left out for missing fields.
    pub dropped: Vec<DroppedBundle>,
    pub test_mode: bool,
}

/// Runs invocations of one compliance rule.
///
/// Holds the rule and settings only; service handles are passed to each
/// [`RulePipeline::run`] call and nothing is kept between invocations.
pub struct RulePipeline {
    rule: Box<dyn ConfigRule>,
    settings: PipelineSettings,
}

impl RulePipeline {
    pub fn new(rule: impl ConfigRule + 'static) -> Self {
        Self::with_settings(rule, PipelineSettings::default())
    }

    pub fn with_settings(rule: impl ConfigRule + 'static, settings: PipelineSettings) -> Self {
        Self::from_boxed(Box::new(rule), settings)
    }

    /// For rules chosen at runtime.
    pub fn from_boxed(rule: Box<dyn ConfigRule>, settings: PipelineSettings) -> Self {
        Self { rule, settings }
    }

    pub fn rule(&self) -> &dyn ConfigRule {
        self.rule.as_ref()
    }

    /// Run one invocation: normalize, resolve, filter, evaluate, build, report.
    pub async fn run(
        &self,
        event: &InboundEvent,
        services: Collaborators<'_>,
    ) -> Result<InvocationOutcome, PipelineError> {
        let span = info_span!(
            "invocation",
            invocation_id = %Uuid::new_v4(),
            rule = self.rule.name(),
        );
        let result = self.run_stages(event, services).instrument(span.clone()).await;

        if let Err(e) = &result {
            span.in_scope(|| tracing::error!(kind = e.kind(), error = %e, "Invocation failed"));
        }
        result
    }

    async fn run_stages(
        &self,
        event: &InboundEvent,
        services: Collaborators<'_>,
    ) -> Result<InvocationOutcome, PipelineError> {
        let notification = normalize(event)?;
        let message_kind = notification.message_kind();

        let snapshot = resolve_snapshot(&notification, services.history).await?;

        let applicability = check_applicability(
            &notification,
            snapshot.as_ref(),
            self.rule.applicable_resource_types(),
        );

        let (built, rule_invoked) = match applicability {
            Applicability::NothingToReport => {
                info!(message_kind = %message_kind, "Out of scope with no resource, nothing to report");
                return Ok(InvocationOutcome::NothingToReport { message_kind });
            }
            Applicability::NotApplicable { subject, reason } => {
                info!(
                    resource_type = %subject.resource_type,
                    resource_id = %subject.resource_id,
                    reason = ?reason,
                    "Evaluation not applicable, skipping rule"
                );
                let built = BuiltEvaluations {
                    evaluations: vec![subject.evaluation(Verdict::NotApplicable, None)],
                    dropped: Vec::new(),
                };
                (built, false)
            }
            Applicability::Applicable => {
                let output = invoke_rule(
                    self.rule.as_ref(),
                    snapshot.as_ref(),
                    &notification.rule_parameters,
                    &notification.context,
                )
                .await?;

                let subject = match &snapshot {
                    Some(snapshot) => Some(EvaluationSubject::from_snapshot(snapshot)),
                    None => EvaluationSubject::for_account(&notification.context),
                };
                (build_evaluations(output, subject.as_ref(), &self.settings), true)
            }
        };

        if built.evaluations.is_empty() {
            info!(message_kind = %message_kind, "No evaluations produced, nothing to report");
            return Ok(InvocationOutcome::NothingToReport { message_kind });
        }

        let outcome = report(
            services.aggregator,
            built.evaluations.clone(),
            &notification.result_token,
            &self.settings,
        )
        .await?;

        Ok(InvocationOutcome::Reported(InvocationReport {
            message_kind,
            rule_invoked,
            evaluations: built.evaluations,
            outcome,
            dropped: built.dropped,
            test_mode: self.settings.is_test_mode(&notification.result_token),
        }))
    }
}
