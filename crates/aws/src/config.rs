use serde::{Deserialize, Serialize};

use confcheck_core::config::{active_profile, profiled_env_opt};

/// Region used when nothing in the environment names one.
pub const DEFAULT_REGION: &str = "us-east-1";

// ── ConfigServiceSettings ────────────────────────────────────────

/// Connection settings for the AWS Config service.
///
/// Reads from environment variables with optional profile prefix.
/// When `CONFCHECK_PROFILE=PROD`, checks `PROD_CONFIG_REGION` before `CONFIG_REGION`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigServiceSettings {
    /// AWS region of the Config service endpoint.
    pub region: String,
    /// Override for the service endpoint (local stacks, VPC endpoints).
    pub endpoint_url: Option<String>,
}

impl Default for ConfigServiceSettings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint_url: None,
        }
    }
}

impl ConfigServiceSettings {
    /// Build settings from environment variables for the active profile.
    ///
    /// `CONFIG_REGION` falls back to `AWS_REGION`, then `AWS_DEFAULT_REGION`.
    pub fn from_env() -> Self {
        Self::from_env_profiled(&active_profile())
    }

    /// Build settings for a specific named profile.
    pub fn from_env_profiled(profile: &str) -> Self {
        let region = profiled_env_opt(profile, "CONFIG_REGION")
            .or_else(|| profiled_env_opt(profile, "AWS_REGION"))
            .or_else(|| profiled_env_opt(profile, "AWS_DEFAULT_REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Self {
            region,
            endpoint_url: profiled_env_opt(profile, "CONFIG_ENDPOINT_URL"),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }
}

// ── Tests ────────────────────────────────────────────────────────
