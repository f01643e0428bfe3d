//! Canonical configuration snapshot.
//!
//! This is the shape a change notification embeds inline. Snapshots fetched
//! from configuration history are converted into it by
//! [`crate::history::snapshot_from_history`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Recording status of a configuration item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemStatus {
    #[serde(rename = "OK")]
    Ok,
    ResourceDiscovered,
    ResourceNotRecorded,
    ResourceDeleted,
    ResourceDeletedNotRecorded,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Ok => "OK",
            ItemStatus::ResourceDiscovered => "ResourceDiscovered",
            ItemStatus::ResourceNotRecorded => "ResourceNotRecorded",
            ItemStatus::ResourceDeleted => "ResourceDeleted",
            ItemStatus::ResourceDeletedNotRecorded => "ResourceDeletedNotRecorded",
        }
    }

    /// True for statuses describing a resource that is gone or was never recorded.
    /// Rules never run against such snapshots.
    pub fn is_not_evaluable(&self) -> bool {
        matches!(
            self,
            ItemStatus::ResourceDeleted
                | ItemStatus::ResourceDeletedNotRecorded
                | ItemStatus::ResourceNotRecorded
        )
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OK" => Ok(ItemStatus::Ok),
            "ResourceDiscovered" => Ok(ItemStatus::ResourceDiscovered),
            "ResourceNotRecorded" => Ok(ItemStatus::ResourceNotRecorded),
            "ResourceDeleted" => Ok(ItemStatus::ResourceDeleted),
            "ResourceDeletedNotRecorded" => Ok(ItemStatus::ResourceDeletedNotRecorded),
            other => Err(format!("unknown configuration item status '{other}'")),
        }
    }
}

/// A relationship from the snapshot's resource to another resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    /// Relationship name, e.g. "Is attached to Volume".
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Canonical state of one resource at one capture time.
///
/// Fields the pipeline reads are typed; everything else the notification
/// carries (region, tags, related events, ...) is preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationSnapshot {
    pub resource_type: String,
    pub resource_id: String,
    #[serde(rename = "configurationItemStatus")]
    pub status: ItemStatus,
    #[serde(rename = "configurationItemCaptureTime")]
    pub capture_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_account_id: Option<String>,
    #[serde(rename = "ARN", default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(
        rename = "configurationStateMd5Hash",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub state_md5_hash: Option<String>,
    #[serde(
        rename = "configurationItemVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,
    /// Resource-specific configuration payload.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub configuration: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConfigurationSnapshot {
    /// Look up a value in the configuration payload by a dotted path,
    /// e.g. `"placement.tenancy"`.
    pub fn configuration_value(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.configuration, |node, key| node.get(key))
    }
}
