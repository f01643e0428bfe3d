//! Compliance-evaluation pipeline.
//!
//! One invocation runs the stages in order:
//! [`normalizer`] → [`resolver`] → [`applicability`] → [`rule`] →
//! [`builder`] → [`reporter`], driven by [`RulePipeline`].
//!
//! The compliance logic itself is a [`ConfigRule`] injected at construction.
//! The configuration-history lookup and the compliance aggregator are
//! collaborator traits ([`ConfigurationHistory`], [`ComplianceAggregator`])
//! handed to each invocation.

pub mod applicability;
pub mod builder;
#[cfg(any(test, feature = "test-utils"))]
pub mod fakes;
pub mod normalizer;
pub mod pipeline;
pub mod reporter;
pub mod resolver;
pub mod rule;
pub mod services;

pub use applicability::{check_applicability, Applicability, NotApplicableReason};
pub use builder::{build_evaluations, BuiltEvaluations, DroppedBundle};
pub use normalizer::normalize;
pub use pipeline::{InvocationOutcome, InvocationReport, RulePipeline};
pub use reporter::report;
pub use resolver::resolve_snapshot;
pub use rule::{invoke_rule, ConfigRule, RuleOutput};
pub use services::{
    Collaborators, ComplianceAggregator, ConfigurationHistory, HistoryQuery,
    PutEvaluationsRequest, PutEvaluationsResponse,
};
