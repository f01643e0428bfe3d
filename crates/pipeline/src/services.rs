//! Collaborator traits for the two external services the pipeline talks to.

use chrono::{DateTime, Utc};
use serde::Serialize;

use confcheck_core::{Evaluation, HistoricalConfigurationItem, ServiceError};

/// Point-in-time configuration-history lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryQuery {
    pub resource_type: String,
    pub resource_id: String,
    /// Only items captured at or before this time are returned, newest first.
    pub later_time: DateTime<Utc>,
    pub limit: usize,
}

/// Source of historical configuration items.
#[async_trait::async_trait]
pub trait ConfigurationHistory: Send + Sync {
    /// Return at most `query.limit` items, most recent first.
    async fn get_resource_config_history(
        &self,
        query: &HistoryQuery,
    ) -> Result<Vec<HistoricalConfigurationItem>, ServiceError>;
}

/// One batch submission to the compliance aggregator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PutEvaluationsRequest {
    pub evaluations: Vec<Evaluation>,
    pub result_token: String,
    /// Validate without recording.
    pub test_mode: bool,
}

/// The aggregator's answer; an empty `failed_evaluations` means full acceptance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PutEvaluationsResponse {
    pub failed_evaluations: Vec<Evaluation>,
}

/// Receiver of compliance evaluations.
#[async_trait::async_trait]
pub trait ComplianceAggregator: Send + Sync {
    async fn put_evaluations(
        &self,
        request: PutEvaluationsRequest,
    ) -> Result<PutEvaluationsResponse, ServiceError>;
}

/// Service handles scoped to one invocation.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub history: &'a dyn ConfigurationHistory,
    pub aggregator: &'a dyn ComplianceAggregator,
}

impl<'a> Collaborators<'a> {
    pub fn new(
        history: &'a dyn ConfigurationHistory,
        aggregator: &'a dyn ComplianceAggregator,
    ) -> Self {
        Self {
            history,
            aggregator,
        }
    }
}
