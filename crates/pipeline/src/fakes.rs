//! In-memory collaborators and a closure-backed rule (testing only).
//!
//! [`MemoryHistory`] and [`MemoryAggregator`] satisfy the collaborator traits
//! without any AWS dependency; [`FnRule`] wraps a closure as a [`ConfigRule`].

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use confcheck_core::{
    ConfigurationSnapshot, HistoricalConfigurationItem, InvocationContext, RuleParameters,
    ServiceError,
};

use crate::rule::{ConfigRule, RuleOutput};
use crate::services::{
    ComplianceAggregator, ConfigurationHistory, HistoryQuery, PutEvaluationsRequest,
    PutEvaluationsResponse,
};

// ---------------------------------------------------------------------------
// MemoryHistory
// ---------------------------------------------------------------------------

/// Configuration history backed by a list of items.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    items: Vec<HistoricalConfigurationItem>,
    failure: Option<String>,
    queries: Mutex<Vec<HistoryQuery>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A history whose every lookup fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_item(mut self, item: HistoricalConfigurationItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn call_count(&self) -> usize {
        self.queries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn queries(&self) -> Vec<HistoryQuery> {
        self.queries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl ConfigurationHistory for MemoryHistory {
    async fn get_resource_config_history(
        &self,
        query: &HistoryQuery,
    ) -> Result<Vec<HistoricalConfigurationItem>, ServiceError> {
        self.queries.lock().unwrap_or_else(PoisonError::into_inner).push(query.clone());

        if let Some(message) = &self.failure {
            return Err(ServiceError::new("GetResourceConfigHistory", message.clone()));
        }

        let mut matching: Vec<_> = self
            .items
            .iter()
            .filter(|item| {
                item.resource_type.as_deref() == Some(query.resource_type.as_str())
                    && item.resource_id.as_deref() == Some(query.resource_id.as_str())
                    && item
                        .configuration_item_capture_time
                        .map_or(false, |t| t <= query.later_time)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.configuration_item_capture_time
                .cmp(&a.configuration_item_capture_time)
        });
        matching.truncate(query.limit);
        Ok(matching)
    }
}

// ---------------------------------------------------------------------------
// MemoryAggregator
// ---------------------------------------------------------------------------

/// Aggregator that records submissions and rejects chosen resource ids.
#[derive(Debug, Default)]
pub struct MemoryAggregator {
    rejected_ids: HashSet<String>,
    failure: Option<String>,
    submissions: Mutex<Vec<PutEvaluationsRequest>>,
}

impl MemoryAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluations for these resource ids come back as failed.
    pub fn rejecting<I, S>(resource_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rejected_ids: resource_ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// An aggregator whose every call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn submissions(&self) -> Vec<PutEvaluationsRequest> {
        self.submissions.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl ComplianceAggregator for MemoryAggregator {
    async fn put_evaluations(
        &self,
        request: PutEvaluationsRequest,
    ) -> Result<PutEvaluationsResponse, ServiceError> {
        if let Some(message) = &self.failure {
            return Err(ServiceError::new("PutEvaluations", message.clone()));
        }

        let failed_evaluations = request
            .evaluations
            .iter()
            .filter(|e| self.rejected_ids.contains(&e.resource_id))
            .cloned()
            .collect();
        self.submissions.lock().unwrap_or_else(PoisonError::into_inner).push(request);

        Ok(PutEvaluationsResponse { failed_evaluations })
    }
}

// ---------------------------------------------------------------------------
// FnRule
// ---------------------------------------------------------------------------

type EvaluateFn = dyn Fn(Option<&ConfigurationSnapshot>, &RuleParameters) -> anyhow::Result<RuleOutput>
    + Send
    + Sync;
type ParameterCheckFn = dyn Fn(&RuleParameters) -> anyhow::Result<()> + Send + Sync;

/// A rule whose verdict comes from a closure. Counts evaluations.
pub struct FnRule {
    name: String,
    resource_types: Vec<&'static str>,
    evaluate: Box<EvaluateFn>,
    parameter_check: Option<Box<ParameterCheckFn>>,
    calls: AtomicUsize,
}

impl FnRule {
    pub fn new<F>(name: impl Into<String>, evaluate: F) -> Self
    where
        F: Fn(Option<&ConfigurationSnapshot>, &RuleParameters) -> anyhow::Result<RuleOutput>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            resource_types: Vec::new(),
            evaluate: Box::new(evaluate),
            parameter_check: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_resource_types(mut self, types: Vec<&'static str>) -> Self {
        self.resource_types = types;
        self
    }

    pub fn with_parameter_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&RuleParameters) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.parameter_check = Some(Box::new(check));
        self
    }

    /// How many times `evaluate` ran.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigRule for FnRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn applicable_resource_types(&self) -> &[&str] {
        &self.resource_types
    }

    fn validate_parameters(&self, parameters: RuleParameters) -> anyhow::Result<RuleParameters> {
        if let Some(check) = &self.parameter_check {
            check(&parameters)?;
        }
        Ok(parameters)
    }

    async fn evaluate(
        &self,
        snapshot: Option<&ConfigurationSnapshot>,
        parameters: &RuleParameters,
        _context: &InvocationContext,
    ) -> anyhow::Result<RuleOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.evaluate)(snapshot, parameters)
    }
}
