//! Data model shared by every stage of the compliance-evaluation pipeline.
//!
//! - [`notification`]: the inbound event envelope and its normalized form
//! - [`snapshot`]: the canonical configuration snapshot
//! - [`history`]: the configuration-history record shape and its field mapping
//! - [`evaluation`]: verdicts, evaluations and report outcomes
//! - [`config`]: env-driven pipeline settings

pub mod config;
pub mod error;
pub mod evaluation;
pub mod history;
pub mod notification;
pub mod snapshot;

pub use config::PipelineSettings;
pub use error::*;
pub use evaluation::*;
pub use history::{history_from_snapshot, snapshot_from_history, HistoricalConfigurationItem, HistoricalRelationship};
pub use notification::*;
pub use snapshot::*;
