//! Evaluation builder: rule output → evaluation records.

use serde::Serialize;
use tracing::{error, warn};

use confcheck_core::{Evaluation, EvaluationSubject, PipelineSettings, Verdict};

use crate::rule::RuleOutput;

/// A multi-result entry left out of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedBundle {
    /// Position in the rule's output.
    pub index: usize,
    pub missing: Vec<&'static str>,
}

/// Evaluations ready for reporting plus the entries that had to be dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuiltEvaluations {
    pub evaluations: Vec<Evaluation>,
    pub dropped: Vec<DroppedBundle>,
}

/// Map a rule's output to evaluations.
///
/// - single verdict: one evaluation for `subject`
/// - bundles: one evaluation per complete bundle, in order; incomplete
///   bundles are dropped and listed in [`BuiltEvaluations::dropped`]
/// - nothing usable (empty output, or no complete bundle): one
///   INSUFFICIENT_DATA evaluation for `subject`
///
/// With no `subject`, only bundles can produce evaluations.
pub fn build_evaluations(
    output: RuleOutput,
    subject: Option<&EvaluationSubject>,
    settings: &PipelineSettings,
) -> BuiltEvaluations {
    let mut built = BuiltEvaluations::default();

    match output {
        RuleOutput::Single {
            verdict,
            annotation,
        } => match subject {
            Some(subject) => built
                .evaluations
                .push(subject.evaluation(verdict, settings.clamp_annotation(annotation))),
            None => error!(
                verdict = %verdict,
                "Rule returned a single verdict but there is no resource to attach it to"
            ),
        },
        RuleOutput::Multiple(bundles) => {
            for (index, bundle) in bundles.into_iter().enumerate() {
                match bundle.into_evaluation() {
                    Ok(mut evaluation) => {
                        evaluation.annotation = settings.clamp_annotation(evaluation.annotation);
                        built.evaluations.push(evaluation);
                    }
                    Err(missing) => {
                        warn!(
                            index,
                            missing = ?missing,
                            "Dropping rule result with missing fields"
                        );
                        built.dropped.push(DroppedBundle { index, missing });
                    }
                }
            }
        }
        RuleOutput::Empty => {}
    }

    if built.evaluations.is_empty() {
        if let Some(subject) = subject {
            warn!(
                resource_type = %subject.resource_type,
                resource_id = %subject.resource_id,
                "Rule produced no usable result, reporting INSUFFICIENT_DATA"
            );
            built
                .evaluations
                .push(subject.evaluation(Verdict::InsufficientData, None));
        }
    }

    built
}
