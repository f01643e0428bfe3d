//! Conversions between AWS SDK shapes and the pipeline's data model.

use std::collections::BTreeMap;

use aws_sdk_config::primitives::DateTime as SdkDateTime;
use aws_sdk_config::types::{self as sdk, ComplianceType};
use chrono::{DateTime, Utc};
use tracing::warn;

use confcheck_core::{Evaluation, HistoricalConfigurationItem, HistoricalRelationship, Verdict};

pub fn to_sdk_time(ts: &DateTime<Utc>) -> SdkDateTime {
    SdkDateTime::from_secs_and_nanos(ts.timestamp(), ts.timestamp_subsec_nanos())
}

/// `None` for instants outside chrono's range.
pub fn from_sdk_time(ts: &SdkDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}

/// Copy one configuration-history item into the historical record shape.
pub fn history_item_from_sdk(item: &sdk::ConfigurationItem) -> HistoricalConfigurationItem {
    HistoricalConfigurationItem {
        version: item.version().map(str::to_string),
        account_id: item.account_id().map(str::to_string),
        configuration_item_capture_time: item
            .configuration_item_capture_time()
            .and_then(from_sdk_time),
        configuration_item_status: item
            .configuration_item_status()
            .map(|s| s.as_str().to_string()),
        configuration_state_id: item.configuration_state_id().map(str::to_string),
        configuration_item_md5_hash: item.configuration_item_md5_hash().map(str::to_string),
        arn: item.arn().map(str::to_string),
        resource_type: item.resource_type().map(|t| t.as_str().to_string()),
        resource_id: item.resource_id().map(str::to_string),
        resource_name: item.resource_name().map(str::to_string),
        aws_region: item.aws_region().map(str::to_string),
        availability_zone: item.availability_zone().map(str::to_string),
        resource_creation_time: item.resource_creation_time().and_then(from_sdk_time),
        tags: to_btree(item.tags()),
        related_events: item.related_events().to_vec(),
        relationships: item
            .relationships()
            .iter()
            .map(relationship_from_sdk)
            .collect(),
        configuration: item.configuration().map(str::to_string),
        supplementary_configuration: to_btree(item.supplementary_configuration()),
        ..Default::default()
    }
}

fn relationship_from_sdk(rel: &sdk::Relationship) -> HistoricalRelationship {
    HistoricalRelationship {
        resource_type: rel.resource_type().map(|t| t.as_str().to_string()),
        resource_id: rel.resource_id().map(str::to_string),
        resource_name: rel.resource_name().map(str::to_string),
        relationship_name: rel.relationship_name().map(str::to_string),
        ..Default::default()
    }
}

fn to_btree(map: Option<&std::collections::HashMap<String, String>>) -> BTreeMap<String, String> {
    map.map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default()
}

/// Build the SDK request entry for one evaluation.
pub fn evaluation_to_sdk(evaluation: &Evaluation) -> Result<sdk::Evaluation, String> {
    sdk::Evaluation::builder()
        .compliance_resource_type(&evaluation.resource_type)
        .compliance_resource_id(&evaluation.resource_id)
        .compliance_type(ComplianceType::from(evaluation.verdict.as_str()))
        .set_annotation(evaluation.annotation.clone())
        .ordering_timestamp(to_sdk_time(&evaluation.ordering_timestamp))
        .build()
        .map_err(|e| e.to_string())
}

/// Map a rejected SDK entry back to the evaluation that was submitted.
///
/// Falls back to decoding the SDK fields when no submitted evaluation has the
/// same resource type and id.
pub fn failed_evaluation_from_sdk(failed: &sdk::Evaluation, submitted: &[Evaluation]) -> Evaluation {
    let resource_type = failed.compliance_resource_type();
    let resource_id = failed.compliance_resource_id();

    if let Some(original) = submitted
        .iter()
        .find(|e| e.resource_type == resource_type && e.resource_id == resource_id)
    {
        return original.clone();
    }

    let verdict = failed
        .compliance_type()
        .as_str()
        .parse::<Verdict>()
        .unwrap_or(Verdict::InsufficientData);
    let ordering_timestamp = from_sdk_time(failed.ordering_timestamp()).unwrap_or_else(|| {
        warn!(resource_id, "failed evaluation carries an unrepresentable timestamp");
        DateTime::<Utc>::UNIX_EPOCH
    });

    Evaluation {
        resource_type: resource_type.to_string(),
        resource_id: resource_id.to_string(),
        verdict,
        ordering_timestamp,
        annotation: failed.annotation().map(str::to_string),
    }
}
