//! Configuration-history record shape and its mapping to the canonical snapshot.
//!
//! The history lookup returns records whose field names differ from the
//! notification's inline configuration item. The mapping is expressed as two
//! tables ([`ITEM_FIELD_MAP`], [`RELATIONSHIP_FIELD_MAP`]) applied in either
//! direction, plus the configuration payload, which history carries as an
//! encoded string and the snapshot carries as structured JSON.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PipelineError;
use crate::snapshot::ConfigurationSnapshot;

/// Top-level field renames: `(history name, canonical name)`.
pub const ITEM_FIELD_MAP: &[(&str, &str)] = &[
    ("accountId", "awsAccountId"),
    ("arn", "ARN"),
    ("configurationItemMD5Hash", "configurationStateMd5Hash"),
    ("version", "configurationItemVersion"),
];

/// Relationship field renames: `(history name, canonical name)`.
pub const RELATIONSHIP_FIELD_MAP: &[(&str, &str)] = &[("relationshipName", "name")];

/// History fields that carry over under the same name and must be present.
const IDENTITY_FIELDS: &[&str] = &[
    "resourceType",
    "resourceId",
    "configurationItemStatus",
    "configurationItemCaptureTime",
];

const CONFIGURATION_FIELD: &str = "configuration";
const RELATIONSHIPS_FIELD: &str = "relationships";

/// A configuration item as returned by the configuration-history lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalConfigurationItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_item_capture_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_item_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_state_id: Option<String>,
    #[serde(
        rename = "configurationItemMD5Hash",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub configuration_item_md5_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_creation_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_events: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<HistoricalRelationship>,
    /// Configuration payload, encoded as a JSON string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub supplementary_configuration: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A relationship entry in the history record shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalRelationship {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Convert a history record into the canonical snapshot shape.
///
/// Every identity field and every source field of [`ITEM_FIELD_MAP`] must be
/// present, and the configuration payload (when present) must decode as JSON;
/// otherwise the result is [`PipelineError::MalformedSnapshot`].
pub fn snapshot_from_history(
    item: &HistoricalConfigurationItem,
) -> Result<ConfigurationSnapshot, PipelineError> {
    let mut fields = to_object(item)?;

    let required = IDENTITY_FIELDS
        .iter()
        .copied()
        .chain(ITEM_FIELD_MAP.iter().map(|(history, _)| *history));
    for field in required {
        if fields.get(field).map_or(true, Value::is_null) {
            return Err(PipelineError::MalformedSnapshot(format!(
                "history record is missing `{field}`"
            )));
        }
    }

    rename_fields(&mut fields, ITEM_FIELD_MAP.iter().copied());
    rename_relationship_fields(&mut fields, RELATIONSHIP_FIELD_MAP.iter().copied());

    if let Some(Value::String(raw)) = fields.remove(CONFIGURATION_FIELD) {
        let decoded: Value = serde_json::from_str(&raw).map_err(|e| {
            PipelineError::MalformedSnapshot(format!("configuration is not valid JSON: {e}"))
        })?;
        fields.insert(CONFIGURATION_FIELD.to_string(), decoded);
    }

    serde_json::from_value(Value::Object(fields))
        .map_err(|e| PipelineError::MalformedSnapshot(e.to_string()))
}

/// Convert a canonical snapshot back into the history record shape.
///
/// Inverse of [`snapshot_from_history`] for every field the mapping covers.
pub fn history_from_snapshot(
    snapshot: &ConfigurationSnapshot,
) -> Result<HistoricalConfigurationItem, PipelineError> {
    let mut fields = to_object(snapshot)?;

    rename_fields(&mut fields, ITEM_FIELD_MAP.iter().map(|(h, c)| (*c, *h)));
    rename_relationship_fields(
        &mut fields,
        RELATIONSHIP_FIELD_MAP.iter().map(|(h, c)| (*c, *h)),
    );

    if let Some(payload) = fields.remove(CONFIGURATION_FIELD) {
        if !payload.is_null() {
            let encoded = serde_json::to_string(&payload)
                .map_err(|e| PipelineError::MalformedSnapshot(e.to_string()))?;
            fields.insert(CONFIGURATION_FIELD.to_string(), Value::String(encoded));
        }
    }

    serde_json::from_value(Value::Object(fields))
        .map_err(|e| PipelineError::MalformedSnapshot(e.to_string()))
}

// ── Helpers ──────────────────────────────────────────────────────

fn to_object<T: Serialize>(value: &T) -> Result<Map<String, Value>, PipelineError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(PipelineError::MalformedSnapshot(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(PipelineError::MalformedSnapshot(e.to_string())),
    }
}

fn rename_fields<'a>(
    fields: &mut Map<String, Value>,
    renames: impl IntoIterator<Item = (&'a str, &'a str)>,
) {
    for (from, to) in renames {
        if let Some(value) = fields.remove(from) {
            fields.insert(to.to_string(), value);
        }
    }
}

fn rename_relationship_fields<'a>(
    fields: &mut Map<String, Value>,
    renames: impl IntoIterator<Item = (&'a str, &'a str)> + Clone,
) {
    if let Some(Value::Array(relationships)) = fields.get_mut(RELATIONSHIPS_FIELD) {
        for relationship in relationships.iter_mut() {
            if let Value::Object(rel) = relationship {
                rename_fields(rel, renames.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ItemStatus;
    use chrono::TimeZone;
    use serde_json::json;

    fn history_item() -> HistoricalConfigurationItem {
        HistoricalConfigurationItem {
            version: Some("1.3".into()),
            account_id: Some("123456789012".into()),
            configuration_item_capture_time: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            configuration_item_status: Some("OK".into()),
            configuration_state_id: Some("1704067200000".into()),
            configuration_item_md5_hash: Some("".into()),
            arn: Some("arn:aws:s3:::b-1".into()),
            resource_type: Some("AWS::S3::Bucket".into()),
            resource_id: Some("b-1".into()),
            resource_name: Some("b-1".into()),
            aws_region: Some("us-east-1".into()),
            tags: BTreeMap::from([("team".to_string(), "platform".to_string())]),
            relationships: vec![HistoricalRelationship {
                resource_type: Some("AWS::IAM::Role".into()),
                resource_id: Some("AROA1".into()),
                resource_name: None,
                relationship_name: Some("Is associated with Role".into()),
                extra: Map::new(),
            }],
            configuration: Some(r#"{"name":"b-1","versioning":{"status":"Enabled"}}"#.into()),
            ..Default::default()
        }
    }

    #[test]
    fn renames_fields_into_canonical_shape() {
        let snapshot = snapshot_from_history(&history_item()).unwrap();

        assert_eq!(snapshot.resource_type, "AWS::S3::Bucket");
        assert_eq!(snapshot.resource_id, "b-1");
        assert_eq!(snapshot.status, ItemStatus::Ok);
        assert_eq!(snapshot.aws_account_id.as_deref(), Some("123456789012"));
        assert_eq!(snapshot.arn.as_deref(), Some("arn:aws:s3:::b-1"));
        assert_eq!(snapshot.state_md5_hash.as_deref(), Some(""));
        assert_eq!(snapshot.version.as_deref(), Some("1.3"));
        assert_eq!(
            snapshot.configuration,
            json!({ "name": "b-1", "versioning": { "status": "Enabled" } })
        );
        assert_eq!(snapshot.relationships[0].name, "Is associated with Role");
        assert_eq!(snapshot.extra.get("awsRegion"), Some(&json!("us-east-1")));
        assert!(!snapshot.extra.contains_key("accountId"));
    }

    #[test]
    fn history_round_trip_is_stable() {
        let original = history_item();
        let snapshot = snapshot_from_history(&original).unwrap();
        let back = history_from_snapshot(&snapshot).unwrap();
        assert_eq!(back, original);

        let again = snapshot_from_history(&back).unwrap();
        assert_eq!(again, snapshot);
    }

    #[test]
    fn every_mapped_field_is_required() {
        for (history_name, _) in ITEM_FIELD_MAP {
            let mut item = history_item();
            match *history_name {
                "accountId" => item.account_id = None,
                "arn" => item.arn = None,
                "configurationItemMD5Hash" => item.configuration_item_md5_hash = None,
                "version" => item.version = None,
                other => panic!("unmapped field {other}"),
            }
            let err = snapshot_from_history(&item).unwrap_err();
            assert!(
                matches!(err, PipelineError::MalformedSnapshot(ref msg) if msg.contains(history_name)),
                "{history_name}: {err}"
            );
        }
    }

    #[test]
    fn missing_identity_is_malformed() {
        let item = HistoricalConfigurationItem {
            resource_id: None,
            ..history_item()
        };
        assert!(matches!(
            snapshot_from_history(&item),
            Err(PipelineError::MalformedSnapshot(_))
        ));
    }

    #[test]
    fn undecodable_configuration_is_malformed() {
        let item = HistoricalConfigurationItem {
            configuration: Some("{not json".into()),
            ..history_item()
        };
        let err = snapshot_from_history(&item).unwrap_err();
        assert!(err.to_string().contains("configuration is not valid JSON"));
    }

    #[test]
    fn unknown_status_is_malformed() {
        let item = HistoricalConfigurationItem {
            configuration_item_status: Some("Vanished".into()),
            ..history_item()
        };
        assert!(matches!(
            snapshot_from_history(&item),
            Err(PipelineError::MalformedSnapshot(_))
        ));
    }

    #[test]
    fn absent_configuration_stays_absent() {
        let item = HistoricalConfigurationItem {
            configuration: None,
            configuration_item_status: Some("ResourceDeleted".into()),
            ..history_item()
        };
        let snapshot = snapshot_from_history(&item).unwrap();
        assert!(snapshot.configuration.is_null());
        assert_eq!(history_from_snapshot(&snapshot).unwrap().configuration, None);
    }
}
