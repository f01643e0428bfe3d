//! Rule capability and invoker.

use tracing::{debug, error};

use confcheck_core::{
    ConfigurationSnapshot, InvocationContext, PipelineError, RuleParameters, Verdict,
    VerdictBundle,
};

/// What a rule returns for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutput {
    /// One verdict for the notification's own resource (or the account).
    Single {
        verdict: Verdict,
        annotation: Option<String>,
    },
    /// Verdicts for several resources, each naming its own identity.
    Multiple(Vec<VerdictBundle>),
    /// The rule produced nothing usable.
    Empty,
}

impl RuleOutput {
    pub fn annotated(verdict: Verdict, annotation: impl Into<String>) -> Self {
        RuleOutput::Single {
            verdict,
            annotation: Some(annotation.into()),
        }
    }
}

impl From<Verdict> for RuleOutput {
    fn from(verdict: Verdict) -> Self {
        RuleOutput::Single {
            verdict,
            annotation: None,
        }
    }
}

impl From<Vec<VerdictBundle>> for RuleOutput {
    fn from(bundles: Vec<VerdictBundle>) -> Self {
        RuleOutput::Multiple(bundles)
    }
}

/// Pluggable compliance logic.
///
/// Implementations decide the verdict; the pipeline handles everything
/// around it (snapshot resolution, applicability, reporting).
#[async_trait::async_trait]
pub trait ConfigRule: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Resource types the rule covers. Empty means every type.
    fn applicable_resource_types(&self) -> &[&str] {
        &[]
    }

    /// Check and normalize the rule parameters before evaluation.
    fn validate_parameters(&self, parameters: RuleParameters) -> anyhow::Result<RuleParameters> {
        Ok(parameters)
    }

    /// Evaluate compliance. `snapshot` is `None` for scheduled triggers.
    async fn evaluate(
        &self,
        snapshot: Option<&ConfigurationSnapshot>,
        parameters: &RuleParameters,
        context: &InvocationContext,
    ) -> anyhow::Result<RuleOutput>;
}

/// Validate the parameters and run the rule once.
///
/// Rule errors are not caught or replaced by a fallback verdict; they come
/// back as [`PipelineError::RuleInvocationFailed`].
pub async fn invoke_rule(
    rule: &dyn ConfigRule,
    snapshot: Option<&ConfigurationSnapshot>,
    parameters: &RuleParameters,
    context: &InvocationContext,
) -> Result<RuleOutput, PipelineError> {
    let failed = |source: anyhow::Error| {
        error!(rule = rule.name(), error = %source, "Rule invocation failed");
        PipelineError::RuleInvocationFailed {
            rule: rule.name().to_string(),
            source,
        }
    };

    let parameters = rule
        .validate_parameters(parameters.clone())
        .map_err(|e| failed(e.context("invalid rule parameters")))?;

    let output = rule
        .evaluate(snapshot, &parameters, context)
        .await
        .map_err(failed)?;

    debug!(rule = rule.name(), output = ?output, "Rule evaluated");
    Ok(output)
}
