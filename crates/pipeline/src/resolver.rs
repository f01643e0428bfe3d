//! Snapshot resolver: produce the configuration snapshot a notification refers to.

use tracing::{debug, info, warn};

use confcheck_core::{
    snapshot_from_history, ConfigurationSnapshot, Notification, PipelineError, SnapshotSummary,
    Trigger,
};

use crate::services::{ConfigurationHistory, HistoryQuery};

/// Resolve the snapshot for a notification.
///
/// - change notification: the embedded snapshot, unchanged
/// - oversized notification: one history lookup, converted to canonical shape
/// - scheduled notification: `None`
pub async fn resolve_snapshot(
    notification: &Notification,
    history: &dyn ConfigurationHistory,
) -> Result<Option<ConfigurationSnapshot>, PipelineError> {
    match &notification.trigger {
        Trigger::Change(snapshot) => {
            debug!(
                resource_type = %snapshot.resource_type,
                resource_id = %snapshot.resource_id,
                "Using embedded configuration item"
            );
            Ok(Some(snapshot.clone()))
        }
        Trigger::OversizedChange(summary) => fetch_snapshot(summary, history).await.map(Some),
        Trigger::Scheduled => Ok(None),
    }
}

async fn fetch_snapshot(
    summary: &SnapshotSummary,
    history: &dyn ConfigurationHistory,
) -> Result<ConfigurationSnapshot, PipelineError> {
    let query = HistoryQuery {
        resource_type: summary.resource_type.clone(),
        resource_id: summary.resource_id.clone(),
        later_time: summary.capture_time,
        limit: 1,
    };

    info!(
        resource_type = %query.resource_type,
        resource_id = %query.resource_id,
        later_time = %query.later_time,
        "Fetching oversized configuration item from history"
    );

    let fetch_failed = |reason: String| PipelineError::SnapshotFetchFailed {
        resource_type: summary.resource_type.clone(),
        resource_id: summary.resource_id.clone(),
        reason,
    };

    let items = history
        .get_resource_config_history(&query)
        .await
        .map_err(|e| fetch_failed(e.to_string()))?;

    let item = items.into_iter().next().ok_or_else(|| {
        warn!(
            resource_type = %summary.resource_type,
            resource_id = %summary.resource_id,
            "Configuration history returned no items"
        );
        fetch_failed("no configuration items returned".into())
    })?;

    snapshot_from_history(&item)
}
