//! Inbound event envelope and the normalized notification built from it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::snapshot::ConfigurationSnapshot;

/// Rule parameters after normalization: every value rendered as text.
pub type RuleParameters = BTreeMap<String, String>;

/// Record handed over by the hosting platform for one rule invocation.
///
/// `invoking_event` and `rule_parameters` are JSON-encoded blobs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEvent {
    pub invoking_event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_parameters: Option<String>,
    #[serde(default)]
    pub event_left_scope: bool,
    pub result_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_rule_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_rule_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_rule_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// The three trigger kinds the pipeline evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    #[serde(rename = "ConfigurationItemChangeNotification")]
    ChangeNotification,
    #[serde(rename = "OversizedConfigurationItemChangeNotification")]
    OversizedChangeNotification,
    ScheduledNotification,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::ChangeNotification => "ConfigurationItemChangeNotification",
            MessageKind::OversizedChangeNotification => {
                "OversizedConfigurationItemChangeNotification"
            }
            MessageKind::ScheduledNotification => "ScheduledNotification",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ConfigurationItemChangeNotification" => Ok(MessageKind::ChangeNotification),
            "OversizedConfigurationItemChangeNotification" => {
                Ok(MessageKind::OversizedChangeNotification)
            }
            "ScheduledNotification" => Ok(MessageKind::ScheduledNotification),
            other => Err(other.to_string()),
        }
    }
}

/// Minimal identity needed to fetch an oversized configuration item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub resource_type: String,
    pub resource_id: String,
    #[serde(rename = "configurationItemCaptureTime")]
    pub capture_time: DateTime<Utc>,
}

/// What triggered the invocation, with the data each trigger kind carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// Full configuration item embedded in the notification.
    Change(ConfigurationSnapshot),
    /// Item too large to embed; only a summary is carried.
    OversizedChange(SnapshotSummary),
    /// Periodic trigger with no resource attached.
    Scheduled,
}

impl Trigger {
    pub fn kind(&self) -> MessageKind {
        match self {
            Trigger::Change(_) => MessageKind::ChangeNotification,
            Trigger::OversizedChange(_) => MessageKind::OversizedChangeNotification,
            Trigger::Scheduled => MessageKind::ScheduledNotification,
        }
    }
}

/// Invocation metadata passed through to the rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InvocationContext {
    pub config_rule_name: Option<String>,
    pub config_rule_arn: Option<String>,
    pub account_id: Option<String>,
    pub execution_role_arn: Option<String>,
    pub notification_creation_time: Option<DateTime<Utc>>,
    pub message_kind: Option<MessageKind>,
}

/// A parsed, immutable notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub trigger: Trigger,
    pub scope_exited: bool,
    pub result_token: String,
    pub rule_parameters: RuleParameters,
    pub context: InvocationContext,
}

impl Notification {
    pub fn message_kind(&self) -> MessageKind {
        self.trigger.kind()
    }
}
