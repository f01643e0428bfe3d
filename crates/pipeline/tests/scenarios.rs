//! End-to-end pipeline scenarios driven through the in-memory collaborators.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use confcheck_core::{
    HistoricalConfigurationItem, InboundEvent, MessageKind, PipelineError, PipelineSettings,
    Verdict, VerdictBundle, ACCOUNT_RESOURCE_TYPE,
};
use confcheck_pipeline::fakes::{FnRule, MemoryAggregator, MemoryHistory};
use confcheck_pipeline::{Collaborators, InvocationOutcome, RuleOutput, RulePipeline};

// ── Fixtures ─────────────────────────────────────────────────────────

fn capture_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn change_event(resource_type: &str, resource_id: &str, status: &str) -> InboundEvent {
    let invoking = json!({
        "messageType": "ConfigurationItemChangeNotification",
        "notificationCreationTime": "2024-01-01T00:00:05Z",
        "awsAccountId": "123456789012",
        "configurationItem": {
            "configurationItemVersion": "1.3",
            "configurationItemCaptureTime": "2024-01-01T00:00:00Z",
            "configurationItemStatus": status,
            "awsAccountId": "123456789012",
            "resourceType": resource_type,
            "resourceId": resource_id,
            "configuration": { "ebsOptimized": true }
        }
    });
    inbound(invoking, false, "token-1")
}

fn oversized_event(resource_type: &str, resource_id: &str) -> InboundEvent {
    let invoking = json!({
        "messageType": "OversizedConfigurationItemChangeNotification",
        "configurationItemSummary": {
            "resourceType": resource_type,
            "resourceId": resource_id,
            "configurationItemCaptureTime": "2024-01-01T00:00:00Z"
        }
    });
    inbound(invoking, false, "token-1")
}

fn scheduled_event(scope_exited: bool) -> InboundEvent {
    let invoking = json!({
        "messageType": "ScheduledNotification",
        "awsAccountId": "123456789012",
        "notificationCreationTime": "2024-01-01T06:00:00Z"
    });
    inbound(invoking, scope_exited, "token-1")
}

fn inbound(invoking: Value, scope_exited: bool, token: &str) -> InboundEvent {
    InboundEvent {
        invoking_event: invoking.to_string(),
        rule_parameters: Some(r#"{"expected":"true"}"#.into()),
        event_left_scope: scope_exited,
        result_token: token.into(),
        config_rule_name: Some("test-rule".into()),
        ..Default::default()
    }
}

fn bucket_history() -> HistoricalConfigurationItem {
    HistoricalConfigurationItem {
        version: Some("1.3".into()),
        account_id: Some("123456789012".into()),
        configuration_item_capture_time: Some(capture_time()),
        configuration_item_status: Some("OK".into()),
        configuration_item_md5_hash: Some("".into()),
        arn: Some("arn:aws:s3:::b-1".into()),
        resource_type: Some("AWS::S3::Bucket".into()),
        resource_id: Some("b-1".into()),
        configuration: Some(r#"{"versioning":"Enabled"}"#.into()),
        ..Default::default()
    }
}

fn verdict_rule(verdict: Verdict) -> FnRule {
    FnRule::new("fixed-verdict", move |_, _| Ok(verdict.into()))
}

fn reported(outcome: InvocationOutcome) -> confcheck_pipeline::InvocationReport {
    match outcome {
        InvocationOutcome::Reported(report) => report,
        other => panic!("expected a report, got {other:?}"),
    }
}

// ── Invocations ──────────────────────────────────────────────────────

#[tokio::test]
async fn inline_change_is_reported() {
    let pipeline = RulePipeline::new(verdict_rule(Verdict::Compliant));
    let history = MemoryHistory::new();
    let aggregator = MemoryAggregator::new();

    let outcome = pipeline
        .run(
            &change_event("AWS::EC2::Instance", "i-123", "OK"),
            Collaborators::new(&history, &aggregator),
        )
        .await
        .unwrap();

    let report = reported(outcome);
    assert!(report.rule_invoked);
    assert_eq!(report.outcome.accepted_count, 1);
    assert_eq!(history.call_count(), 0);

    let submissions = aggregator.submissions();
    assert_eq!(submissions.len(), 1);
    let evaluation = &submissions[0].evaluations[0];
    assert_eq!(evaluation.resource_type, "AWS::EC2::Instance");
    assert_eq!(evaluation.resource_id, "i-123");
    assert_eq!(evaluation.verdict, Verdict::Compliant);
    assert_eq!(evaluation.ordering_timestamp, capture_time());
}

#[tokio::test]
async fn deleted_resource_skips_rule() {
    let rule = verdict_rule(Verdict::Compliant);
    let pipeline = RulePipeline::new(rule);
    let history = MemoryHistory::new();
    let aggregator = MemoryAggregator::new();

    let report = reported(
        pipeline
            .run(
                &change_event("AWS::EC2::Instance", "i-123", "ResourceDeleted"),
                Collaborators::new(&history, &aggregator),
            )
            .await
            .unwrap(),
    );

    assert!(!report.rule_invoked);
    assert_eq!(report.evaluations.len(), 1);
    assert_eq!(report.evaluations[0].verdict, Verdict::NotApplicable);
    assert_eq!(report.evaluations[0].resource_id, "i-123");
    assert_eq!(aggregator.submissions()[0].evaluations, report.evaluations);
}

#[tokio::test]
async fn scope_exit_skips_rule() {
    let pipeline = RulePipeline::new(FnRule::new("must-not-run", |_, _| {
        Err(anyhow::anyhow!("rule should not have been invoked"))
    }));
    let history = MemoryHistory::new();
    let aggregator = MemoryAggregator::new();

    let mut event = change_event("AWS::EC2::Instance", "i-123", "OK");
    event.event_left_scope = true;

    let report = reported(
        pipeline
            .run(&event, Collaborators::new(&history, &aggregator))
            .await
            .unwrap(),
    );
    assert!(!report.rule_invoked);
    assert_eq!(report.evaluations[0].verdict, Verdict::NotApplicable);
}

#[tokio::test]
async fn oversized_with_empty_history_fails() {
    let pipeline = RulePipeline::new(verdict_rule(Verdict::Compliant));
    let history = MemoryHistory::new();
    let aggregator = MemoryAggregator::new();

    let err = pipeline
        .run(
            &oversized_event("AWS::S3::Bucket", "b-1"),
            Collaborators::new(&history, &aggregator),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::SnapshotFetchFailed { .. }));
    assert_eq!(history.call_count(), 1);
    assert!(aggregator.submissions().is_empty());
}

#[tokio::test]
async fn oversized_with_history_is_evaluated() {
    let pipeline = RulePipeline::new(FnRule::new("versioning", |snapshot, _| {
        let snapshot = snapshot.ok_or_else(|| anyhow::anyhow!("no snapshot"))?;
        let enabled = snapshot.configuration["versioning"] == "Enabled";
        Ok(if enabled { Verdict::Compliant } else { Verdict::NonCompliant }.into())
    }));
    let history = MemoryHistory::new().with_item(bucket_history());
    let aggregator = MemoryAggregator::new();

    let report = reported(
        pipeline
            .run(
                &oversized_event("AWS::S3::Bucket", "b-1"),
                Collaborators::new(&history, &aggregator),
            )
            .await
            .unwrap(),
    );

    assert_eq!(report.message_kind, MessageKind::OversizedChangeNotification);
    assert_eq!(report.evaluations[0].verdict, Verdict::Compliant);
    assert_eq!(report.evaluations[0].resource_id, "b-1");
}

#[tokio::test]
async fn incomplete_bundle_is_dropped() {
    let pipeline = RulePipeline::new(FnRule::new("buckets", |_, _| {
        let ts = capture_time();
        Ok(RuleOutput::Multiple(vec![
            VerdictBundle::new("AWS::S3::Bucket", "b-1", Verdict::Compliant, ts),
            VerdictBundle {
                ordering_timestamp: None,
                ..VerdictBundle::new("AWS::S3::Bucket", "b-2", Verdict::NonCompliant, ts)
            },
            VerdictBundle::new("AWS::S3::Bucket", "b-3", Verdict::NonCompliant, ts),
        ]))
    }));
    let history = MemoryHistory::new();
    let aggregator = MemoryAggregator::new();

    let report = reported(
        pipeline
            .run(
                &change_event("AWS::S3::Bucket", "b-0", "OK"),
                Collaborators::new(&history, &aggregator),
            )
            .await
            .unwrap(),
    );

    let submitted: Vec<_> = aggregator.submissions()[0]
        .evaluations
        .iter()
        .map(|e| (e.resource_id.clone(), e.verdict))
        .collect();
    assert_eq!(
        submitted,
        vec![
            ("b-1".to_string(), Verdict::Compliant),
            ("b-3".to_string(), Verdict::NonCompliant)
        ]
    );
    assert_eq!(report.dropped.len(), 1);
    assert_eq!(report.dropped[0].index, 1);
}

#[tokio::test]
async fn partial_rejection_is_reported_as_error() {
    let pipeline = RulePipeline::new(FnRule::new("buckets", |_, _| {
        let ts = capture_time();
        Ok(RuleOutput::Multiple(
            ["b-1", "b-2", "b-3"]
                .into_iter()
                .map(|id| VerdictBundle::new("AWS::S3::Bucket", id, Verdict::Compliant, ts))
                .collect(),
        ))
    }));
    let history = MemoryHistory::new();
    let aggregator = MemoryAggregator::rejecting(["b-2"]);

    let err = pipeline
        .run(
            &change_event("AWS::S3::Bucket", "b-0", "OK"),
            Collaborators::new(&history, &aggregator),
        )
        .await
        .unwrap_err();

    match err {
        PipelineError::PartialReportFailure { outcome } => {
            assert_eq!(outcome.accepted_count, 2);
            assert_eq!(outcome.failed_evaluations.len(), 1);
            assert_eq!(outcome.failed_evaluations[0].resource_id, "b-2");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(aggregator.submissions()[0].evaluations.len(), 3);
}

#[tokio::test]
async fn rule_failure_is_not_masked() {
    let pipeline = RulePipeline::new(FnRule::new("broken", |_, _| {
        Err(anyhow::anyhow!("unexpected configuration shape"))
    }));
    let history = MemoryHistory::new();
    let aggregator = MemoryAggregator::new();

    let err = pipeline
        .run(
            &change_event("AWS::EC2::Instance", "i-123", "OK"),
            Collaborators::new(&history, &aggregator),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::RuleInvocationFailed { .. }));
    assert!(aggregator.submissions().is_empty());
}

#[tokio::test]
async fn unsupported_trigger_never_reports() {
    let pipeline = RulePipeline::new(verdict_rule(Verdict::Compliant));
    let history = MemoryHistory::new();
    let aggregator = MemoryAggregator::new();

    let event = inbound(
        json!({ "messageType": "ConfigurationSnapshotDeliveryCompleted" }),
        false,
        "token-1",
    );
    let err = pipeline
        .run(&event, Collaborators::new(&history, &aggregator))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::IncompatibleMessageType { .. }));
    assert!(aggregator.submissions().is_empty());
}

#[tokio::test]
async fn resource_type_outside_rule_is_not_applicable() {
    let rule = FnRule::new("ec2-only", |_, _| Ok(Verdict::NonCompliant.into()))
        .with_resource_types(vec!["AWS::EC2::Instance"]);
    let pipeline = RulePipeline::new(rule);
    let history = MemoryHistory::new();
    let aggregator = MemoryAggregator::new();

    let report = reported(
        pipeline
            .run(
                &change_event("AWS::S3::Bucket", "b-1", "OK"),
                Collaborators::new(&history, &aggregator),
            )
            .await
            .unwrap(),
    );
    assert!(!report.rule_invoked);
    assert_eq!(report.evaluations[0].verdict, Verdict::NotApplicable);
}

#[tokio::test]
async fn scheduled_trigger_reports_against_account() {
    let pipeline = RulePipeline::new(FnRule::new("periodic", |snapshot, _| {
        assert!(snapshot.is_none());
        Ok(Verdict::NonCompliant.into())
    }));
    let history = MemoryHistory::new();
    let aggregator = MemoryAggregator::new();

    let report = reported(
        pipeline
            .run(&scheduled_event(false), Collaborators::new(&history, &aggregator))
            .await
            .unwrap(),
    );

    let evaluation = &report.evaluations[0];
    assert_eq!(evaluation.resource_type, ACCOUNT_RESOURCE_TYPE);
    assert_eq!(evaluation.resource_id, "123456789012");
    assert_eq!(
        evaluation.ordering_timestamp,
        Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn scheduled_out_of_scope_reports_nothing() {
    let rule = verdict_rule(Verdict::Compliant);
    let pipeline = RulePipeline::new(rule);
    let history = MemoryHistory::new();
    let aggregator = MemoryAggregator::new();

    let outcome = pipeline
        .run(&scheduled_event(true), Collaborators::new(&history, &aggregator))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        InvocationOutcome::NothingToReport {
            message_kind: MessageKind::ScheduledNotification
        }
    );
    assert!(aggregator.submissions().is_empty());
}

#[tokio::test]
async fn scheduled_without_account_is_rejected_before_rule() {
    let pipeline = RulePipeline::new(FnRule::new("must-not-run", |_, _| {
        Err(anyhow::anyhow!("rule should not have been invoked"))
    }));
    let history = MemoryHistory::new();
    let aggregator = MemoryAggregator::new();

    let event = inbound(
        json!({
            "messageType": "ScheduledNotification",
            "notificationCreationTime": "2024-01-01T06:00:00Z"
        }),
        false,
        "token-1",
    );
    let err = pipeline
        .run(&event, Collaborators::new(&history, &aggregator))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::InvalidEvent(_)));
    assert!(aggregator.submissions().is_empty());
}

#[tokio::test]
async fn test_mode_token_is_forwarded() {
    let pipeline = RulePipeline::with_settings(
        verdict_rule(Verdict::Compliant),
        PipelineSettings::default(),
    );
    let history = MemoryHistory::new();
    let aggregator = MemoryAggregator::new();

    let mut event = change_event("AWS::EC2::Instance", "i-123", "OK");
    event.result_token = "TESTMODE".into();

    let report = reported(
        pipeline
            .run(&event, Collaborators::new(&history, &aggregator))
            .await
            .unwrap(),
    );
    assert!(report.test_mode);
    assert!(aggregator.submissions()[0].test_mode);
}

#[tokio::test]
async fn rerun_yields_same_evaluations() {
    let pipeline = RulePipeline::new(verdict_rule(Verdict::NonCompliant));
    let history = MemoryHistory::new().with_item(bucket_history());
    let aggregator = MemoryAggregator::new();
    let event = oversized_event("AWS::S3::Bucket", "b-1");

    for _ in 0..2 {
        pipeline
            .run(&event, Collaborators::new(&history, &aggregator))
            .await
            .unwrap();
    }

    let submissions = aggregator.submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0].evaluations, submissions[1].evaluations);
}
