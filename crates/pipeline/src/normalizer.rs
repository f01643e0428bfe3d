//! Notification normalizer: inbound event → [`Notification`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use confcheck_core::{
    ConfigurationSnapshot, InboundEvent, InvocationContext, MessageKind, Notification,
    PipelineError, RuleParameters, SnapshotSummary, Trigger,
};

/// Fields of the invoking-event blob the pipeline reads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvokingEvent {
    configuration_item: Option<Value>,
    configuration_item_summary: Option<Value>,
    notification_creation_time: Option<DateTime<Utc>>,
    aws_account_id: Option<String>,
}

/// Parse both blobs of an inbound event into a [`Notification`].
///
/// The message type is checked before anything else is looked at, so an
/// unsupported trigger never reaches applicability filtering.
pub fn normalize(event: &InboundEvent) -> Result<Notification, PipelineError> {
    let raw: Value = serde_json::from_str(&event.invoking_event)
        .map_err(|e| PipelineError::InvalidEvent(format!("invokingEvent: {e}")))?;
    if !raw.is_object() {
        return Err(PipelineError::InvalidEvent(
            "invokingEvent must be a JSON object".into(),
        ));
    }

    let kind = message_kind(&raw)?;

    let invoking: InvokingEvent = serde_json::from_value(raw)
        .map_err(|e| PipelineError::InvalidEvent(format!("invokingEvent: {e}")))?;

    let rule_parameters = parse_rule_parameters(event.rule_parameters.as_deref())?;

    let trigger = match kind {
        MessageKind::ChangeNotification => {
            let item = invoking.configuration_item.ok_or_else(|| {
                PipelineError::MalformedSnapshot(
                    "change notification carries no configurationItem".into(),
                )
            })?;
            let snapshot: ConfigurationSnapshot = serde_json::from_value(item)
                .map_err(|e| PipelineError::MalformedSnapshot(format!("configurationItem: {e}")))?;
            Trigger::Change(snapshot)
        }
        MessageKind::OversizedChangeNotification => {
            let summary = invoking.configuration_item_summary.ok_or_else(|| {
                PipelineError::MalformedSnapshot(
                    "oversized notification carries no configurationItemSummary".into(),
                )
            })?;
            let summary: SnapshotSummary = serde_json::from_value(summary).map_err(|e| {
                PipelineError::MalformedSnapshot(format!("configurationItemSummary: {e}"))
            })?;
            Trigger::OversizedChange(summary)
        }
        MessageKind::ScheduledNotification => Trigger::Scheduled,
    };

    let account_id = invoking
        .aws_account_id
        .or_else(|| event.account_id.clone());
    if kind == MessageKind::ScheduledNotification {
        if account_id.is_none() {
            return Err(PipelineError::InvalidEvent(
                "scheduled notification carries no account id".into(),
            ));
        }
        if invoking.notification_creation_time.is_none() {
            return Err(PipelineError::InvalidEvent(
                "scheduled notification carries no notificationCreationTime".into(),
            ));
        }
    }

    let context = InvocationContext {
        config_rule_name: event.config_rule_name.clone(),
        config_rule_arn: event.config_rule_arn.clone(),
        account_id,
        execution_role_arn: event.execution_role_arn.clone(),
        notification_creation_time: invoking.notification_creation_time,
        message_kind: Some(kind),
    };

    debug!(
        message_kind = %kind,
        scope_exited = event.event_left_scope,
        parameters = rule_parameters.len(),
        "Normalized notification"
    );

    Ok(Notification {
        trigger,
        scope_exited: event.event_left_scope,
        result_token: event.result_token.clone(),
        rule_parameters,
        context,
    })
}

/// Read `messageType` alone; a missing or non-string type is incompatible.
fn message_kind(raw: &Value) -> Result<MessageKind, PipelineError> {
    let message_type = match raw.get("messageType") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    message_type
        .parse()
        .map_err(|other| PipelineError::IncompatibleMessageType {
            message_type: other,
        })
}

/// Decode the rule-parameters blob. Absent, blank or `null` yields an empty map;
/// non-string values are rendered as their JSON text.
fn parse_rule_parameters(raw: Option<&str>) -> Result<RuleParameters, PipelineError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(RuleParameters::new()),
        Some(raw) => raw,
    };

    let value: Value = serde_json::from_str(raw)
        .map_err(|e| PipelineError::InvalidEvent(format!("ruleParameters: {e}")))?;

    match value {
        Value::Null => Ok(RuleParameters::new()),
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, text)
            })
            .collect()),
        other => Err(PipelineError::InvalidEvent(format!(
            "ruleParameters must be an object, got {other}"
        ))),
    }
}
