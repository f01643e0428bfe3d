//! AWS Config client.
//!
//! Provides [`ConfigServiceClient`], which serves both pipeline collaborators:
//! configuration-history lookups (`GetResourceConfigHistory`) and evaluation
//! submission (`PutEvaluations`).

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_config::error::DisplayErrorContext;
use aws_sdk_config::types::ResourceType;
use tracing::{debug, info};

use confcheck_core::{HistoricalConfigurationItem, ServiceError};
use confcheck_pipeline::{
    ComplianceAggregator, ConfigurationHistory, HistoryQuery, PutEvaluationsRequest,
    PutEvaluationsResponse,
};

use crate::config::ConfigServiceSettings;
use crate::convert::{
    evaluation_to_sdk, failed_evaluation_from_sdk, history_item_from_sdk, to_sdk_time,
};

const GET_HISTORY: &str = "GetResourceConfigHistory";
const PUT_EVALUATIONS: &str = "PutEvaluations";

/// Client for the AWS Config service.
pub struct ConfigServiceClient {
    client: aws_sdk_config::Client,
}

impl ConfigServiceClient {
    /// Create a client for the region (and optional endpoint) in `settings`.
    ///
    /// Credentials come from the default provider chain.
    pub async fn new(settings: ConfigServiceSettings) -> Self {
        let region = aws_sdk_config::config::Region::new(settings.region.clone());
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);
        if let Some(url) = &settings.endpoint_url {
            loader = loader.endpoint_url(url);
        }
        let aws_cfg = loader.load().await;

        info!(
            region = %settings.region,
            endpoint_url = settings.endpoint_url.as_deref().unwrap_or("default"),
            "ConfigServiceClient initialised"
        );

        Self {
            client: aws_sdk_config::Client::new(&aws_cfg),
        }
    }
}

#[async_trait]
impl ConfigurationHistory for ConfigServiceClient {
    async fn get_resource_config_history(
        &self,
        query: &HistoryQuery,
    ) -> Result<Vec<HistoricalConfigurationItem>, ServiceError> {
        debug!(
            resource_type = %query.resource_type,
            resource_id = %query.resource_id,
            later_time = %query.later_time,
            "Fetching configuration history"
        );

        let limit = i32::try_from(query.limit).unwrap_or(i32::MAX);
        let output = self
            .client
            .get_resource_config_history()
            .resource_type(ResourceType::from(query.resource_type.as_str()))
            .resource_id(&query.resource_id)
            .later_time(to_sdk_time(&query.later_time))
            .limit(limit)
            .send()
            .await
            .map_err(|e| ServiceError::new(GET_HISTORY, DisplayErrorContext(&e).to_string()))?;

        let items: Vec<_> = output
            .configuration_items()
            .iter()
            .map(history_item_from_sdk)
            .collect();
        debug!(count = items.len(), "Configuration history fetched");
        Ok(items)
    }
}

#[async_trait]
impl ComplianceAggregator for ConfigServiceClient {
    async fn put_evaluations(
        &self,
        request: PutEvaluationsRequest,
    ) -> Result<PutEvaluationsResponse, ServiceError> {
        let evaluations = request
            .evaluations
            .iter()
            .map(evaluation_to_sdk)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ServiceError::new(PUT_EVALUATIONS, e))?;

        info!(
            count = evaluations.len(),
            test_mode = request.test_mode,
            "Submitting evaluations"
        );

        let output = self
            .client
            .put_evaluations()
            .set_evaluations(Some(evaluations))
            .result_token(&request.result_token)
            .test_mode(request.test_mode)
            .send()
            .await
            .map_err(|e| {
                ServiceError::new(PUT_EVALUATIONS, DisplayErrorContext(&e).to_string())
            })?;

        let failed_evaluations = output
            .failed_evaluations()
            .iter()
            .map(|failed| failed_evaluation_from_sdk(failed, &request.evaluations))
            .collect();
        Ok(PutEvaluationsResponse { failed_evaluations })
    }
}
