//! Built-in sample rules for local runs.

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde_json::Value;

use confcheck_core::{ConfigurationSnapshot, InvocationContext, RuleParameters, Verdict};
use confcheck_pipeline::{ConfigRule, RuleOutput};

use crate::cli::SampleRule;

pub fn build_rule(choice: SampleRule) -> Box<dyn ConfigRule> {
    match choice {
        SampleRule::Placeholder => Box::new(PlaceholderRule),
        SampleRule::EbsOptimized => Box::new(EbsOptimizedRule),
    }
}

/// Starter rule body: reports every resource as not applicable.
pub struct PlaceholderRule;

#[async_trait]
impl ConfigRule for PlaceholderRule {
    fn name(&self) -> &str {
        "placeholder"
    }

    async fn evaluate(
        &self,
        _snapshot: Option<&ConfigurationSnapshot>,
        _parameters: &RuleParameters,
        _context: &InvocationContext,
    ) -> anyhow::Result<RuleOutput> {
        Ok(Verdict::NotApplicable.into())
    }
}

const EBS_OPTIMIZED: &str = "ebsOptimized";

/// EC2 instances whose `ebsOptimized` flag matches the expected value comply.
pub struct EbsOptimizedRule;

impl EbsOptimizedRule {
    fn expected(parameters: &RuleParameters) -> anyhow::Result<bool> {
        match parameters.get(EBS_OPTIMIZED) {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("`{EBS_OPTIMIZED}` must be true or false, got '{raw}'")),
            None => Ok(true),
        }
    }
}

#[async_trait]
impl ConfigRule for EbsOptimizedRule {
    fn name(&self) -> &str {
        "ebs-optimized-instance"
    }

    fn applicable_resource_types(&self) -> &[&str] {
        &["AWS::EC2::Instance"]
    }

    fn validate_parameters(&self, parameters: RuleParameters) -> anyhow::Result<RuleParameters> {
        Self::expected(&parameters)?;
        Ok(parameters)
    }

    async fn evaluate(
        &self,
        snapshot: Option<&ConfigurationSnapshot>,
        parameters: &RuleParameters,
        _context: &InvocationContext,
    ) -> anyhow::Result<RuleOutput> {
        // Scheduled runs carry no instance.
        let Some(snapshot) = snapshot else {
            return Ok(Verdict::NotApplicable.into());
        };
        let expected = Self::expected(parameters)?;

        let Some(actual) = snapshot
            .configuration_value(EBS_OPTIMIZED)
            .and_then(Value::as_bool)
        else {
            bail!("instance {} has no boolean `{EBS_OPTIMIZED}` attribute", snapshot.resource_id);
        };

        Ok(if actual == expected {
            Verdict::Compliant.into()
        } else {
            RuleOutput::annotated(
                Verdict::NonCompliant,
                format!("{EBS_OPTIMIZED} is {actual}, expected {expected}"),
            )
        })
    }
}
