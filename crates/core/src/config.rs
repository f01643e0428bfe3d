use std::env;

use serde::{Deserialize, Serialize};

/// Env var naming the active profile.
pub const PROFILE_ENV: &str = "CONFCHECK_PROFILE";

/// Result token that marks an invocation as a dry run.
pub const DEFAULT_TEST_MODE_TOKEN: &str = "TESTMODE";

/// Longest annotation the aggregator accepts.
pub const DEFAULT_ANNOTATION_MAX_LEN: usize = 256;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Active profile, upper-cased (empty = default).
pub fn active_profile() -> String {
    env_opt(PROFILE_ENV)
        .map(|s| s.to_uppercase())
        .unwrap_or_default()
}

/// Read a profiled env var: tries `{PROFILE}_{KEY}` first, falls back to `{KEY}`.
pub fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

pub fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

pub fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── PipelineSettings ─────────────────────────────────────────────

/// Settings that shape how the pipeline builds and reports evaluations.
///
/// When `CONFCHECK_PROFILE=PROD`, checks `PROD_CONFCHECK_TEST_MODE_TOKEN`
/// before `CONFCHECK_TEST_MODE_TOKEN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Result token that turns the submission into a validation-only call.
    pub test_mode_token: String,
    /// Annotations longer than this are truncated (in characters).
    pub annotation_max_len: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            test_mode_token: DEFAULT_TEST_MODE_TOKEN.to_string(),
            annotation_max_len: DEFAULT_ANNOTATION_MAX_LEN,
        }
    }
}

impl PipelineSettings {
    pub fn from_env() -> Self {
        Self::from_env_profiled(&active_profile())
    }

    pub fn from_env_profiled(profile: &str) -> Self {
        Self {
            test_mode_token: profiled_env_or(
                profile,
                "CONFCHECK_TEST_MODE_TOKEN",
                DEFAULT_TEST_MODE_TOKEN,
            ),
            annotation_max_len: profiled_env_usize(
                profile,
                "CONFCHECK_ANNOTATION_MAX_LEN",
                DEFAULT_ANNOTATION_MAX_LEN,
            ),
        }
    }

    pub fn is_test_mode(&self, result_token: &str) -> bool {
        result_token == self.test_mode_token
    }

    /// Cut an annotation down to `annotation_max_len` characters.
    pub fn clamp_annotation(&self, annotation: Option<String>) -> Option<String> {
        annotation.map(|text| {
            if text.chars().count() > self.annotation_max_len {
                tracing::debug!(
                    len = text.chars().count(),
                    max = self.annotation_max_len,
                    "Truncating annotation"
                );
                text.chars().take(self.annotation_max_len).collect()
            } else {
                text
            }
        })
    }
}
