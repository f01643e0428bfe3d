//! Verdicts, evaluations and report outcomes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notification::InvocationContext;
use crate::snapshot::ConfigurationSnapshot;

/// Resource type used when a verdict applies to the whole account rather than
/// one resource (scheduled triggers).
pub const ACCOUNT_RESOURCE_TYPE: &str = "AWS::::Account";

/// Compliance verdict for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Compliant,
    NonCompliant,
    NotApplicable,
    InsufficientData,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Compliant => "COMPLIANT",
            Verdict::NonCompliant => "NON_COMPLIANT",
            Verdict::NotApplicable => "NOT_APPLICABLE",
            Verdict::InsufficientData => "INSUFFICIENT_DATA",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COMPLIANT" => Ok(Verdict::Compliant),
            "NON_COMPLIANT" => Ok(Verdict::NonCompliant),
            "NOT_APPLICABLE" => Ok(Verdict::NotApplicable),
            "INSUFFICIENT_DATA" => Ok(Verdict::InsufficientData),
            other => Err(format!("unknown compliance verdict '{other}'")),
        }
    }
}

/// One entry of a multi-result rule output.
///
/// Every field is optional because rules build these by hand; the evaluation
/// builder drops bundles that leave any required field unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictBundle {
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub verdict: Option<Verdict>,
    pub ordering_timestamp: Option<DateTime<Utc>>,
    pub annotation: Option<String>,
}

impl VerdictBundle {
    /// A bundle with every required field set.
    pub fn new(
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        verdict: Verdict,
        ordering_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            resource_type: Some(resource_type.into()),
            resource_id: Some(resource_id.into()),
            verdict: Some(verdict),
            ordering_timestamp: Some(ordering_timestamp),
            annotation: None,
        }
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    /// Names of the required fields this bundle leaves unset.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.resource_type.is_none() {
            missing.push("resourceType");
        }
        if self.resource_id.is_none() {
            missing.push("resourceId");
        }
        if self.verdict.is_none() {
            missing.push("verdict");
        }
        if self.ordering_timestamp.is_none() {
            missing.push("orderingTimestamp");
        }
        missing
    }

    /// Convert into an evaluation, or return the missing field names.
    pub fn into_evaluation(self) -> Result<Evaluation, Vec<&'static str>> {
        match self {
            VerdictBundle {
                resource_type: Some(resource_type),
                resource_id: Some(resource_id),
                verdict: Some(verdict),
                ordering_timestamp: Some(ordering_timestamp),
                annotation,
            } => Ok(Evaluation {
                resource_type,
                resource_id,
                verdict,
                ordering_timestamp,
                annotation,
            }),
            incomplete => Err(incomplete.missing_fields()),
        }
    }
}

/// A verdict bound to a resource, ready for submission to the aggregator.
///
/// Serialized with the aggregator's field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(rename = "ComplianceResourceType")]
    pub resource_type: String,
    #[serde(rename = "ComplianceResourceId")]
    pub resource_id: String,
    #[serde(rename = "ComplianceType")]
    pub verdict: Verdict,
    #[serde(rename = "OrderingTimestamp")]
    pub ordering_timestamp: DateTime<Utc>,
    #[serde(rename = "Annotation", default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

/// Resource identity and ordering timestamp a verdict is attached to when the
/// rule itself does not name one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationSubject {
    pub resource_type: String,
    pub resource_id: String,
    pub ordering_timestamp: DateTime<Utc>,
}

impl EvaluationSubject {
    pub fn from_snapshot(snapshot: &ConfigurationSnapshot) -> Self {
        Self {
            resource_type: snapshot.resource_type.clone(),
            resource_id: snapshot.resource_id.clone(),
            ordering_timestamp: snapshot.capture_time,
        }
    }

    /// Account-level subject for scheduled triggers. Needs both the account id
    /// and the notification creation time.
    pub fn for_account(context: &InvocationContext) -> Option<Self> {
        Some(Self {
            resource_type: ACCOUNT_RESOURCE_TYPE.to_string(),
            resource_id: context.account_id.clone()?,
            ordering_timestamp: context.notification_creation_time?,
        })
    }

    pub fn evaluation(&self, verdict: Verdict, annotation: Option<String>) -> Evaluation {
        Evaluation {
            resource_type: self.resource_type.clone(),
            resource_id: self.resource_id.clone(),
            verdict,
            ordering_timestamp: self.ordering_timestamp,
            annotation,
        }
    }
}

/// What the aggregator made of one submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportOutcome {
    pub accepted_count: usize,
    pub failed_evaluations: Vec<Evaluation>,
}

impl ReportOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed_evaluations.is_empty()
    }
}
