//! Applicability filter: decide whether the rule should run at all.

use serde::Serialize;

use confcheck_core::{ConfigurationSnapshot, EvaluationSubject, ItemStatus, Notification};

/// Why a snapshot was judged not applicable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotApplicableReason {
    /// The notification says the resource left the rule's scope.
    ScopeExited,
    /// The resource is deleted or not recorded.
    Status(ItemStatus),
    /// The rule does not cover this resource type.
    ResourceTypeOutOfScope,
}

/// Outcome of the applicability check.
#[derive(Debug, Clone, PartialEq)]
pub enum Applicability {
    /// Invoke the rule.
    Applicable,
    /// Skip the rule and report NOT_APPLICABLE for `subject`.
    NotApplicable {
        subject: EvaluationSubject,
        reason: NotApplicableReason,
    },
    /// Out of scope with no resource to attach a verdict to: report nothing.
    NothingToReport,
}

/// Check a resolved snapshot (or its absence) against the notification's
/// scope flag, the snapshot status and the rule's resource types.
///
/// An empty `applicable_types` means the rule covers every type.
pub fn check_applicability(
    notification: &Notification,
    snapshot: Option<&ConfigurationSnapshot>,
    applicable_types: &[&str],
) -> Applicability {
    let Some(snapshot) = snapshot else {
        return if notification.scope_exited {
            Applicability::NothingToReport
        } else {
            Applicability::Applicable
        };
    };

    let reason = if notification.scope_exited {
        Some(NotApplicableReason::ScopeExited)
    } else if snapshot.status.is_not_evaluable() {
        Some(NotApplicableReason::Status(snapshot.status))
    } else if !applicable_types.is_empty()
        && !applicable_types.contains(&snapshot.resource_type.as_str())
    {
        Some(NotApplicableReason::ResourceTypeOutOfScope)
    } else {
        None
    };

    match reason {
        Some(reason) => Applicability::NotApplicable {
            subject: EvaluationSubject::from_snapshot(snapshot),
            reason,
        },
        None => Applicability::Applicable,
    }
}
