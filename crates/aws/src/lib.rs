//! AWS Config implementations of the pipeline's collaborator traits.

pub mod client;
pub mod config;
pub mod convert;

pub use client::ConfigServiceClient;
pub use config::ConfigServiceSettings;
