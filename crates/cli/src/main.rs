mod cli;
mod event;
mod samples;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use confcheck_aws::{ConfigServiceClient, ConfigServiceSettings};
use confcheck_core::config::load_dotenv;
use confcheck_core::{PipelineError, PipelineSettings};
use confcheck_pipeline::{Collaborators, RulePipeline};

use crate::cli::CliArgs;

/// `CONFCHECK_LOG_FORMAT=json` switches log output to JSON lines.
const LOG_FORMAT_ENV: &str = "CONFCHECK_LOG_FORMAT";

fn init_tracing() {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr);

    if std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    init_tracing();

    let args = CliArgs::parse();
    let profile = args.profile.to_uppercase();

    let settings = PipelineSettings::from_env_profiled(&profile);
    let mut event = event::load_event(&args.event)?;
    if args.test_mode {
        event.result_token = settings.test_mode_token.clone();
    }

    let mut service_settings = ConfigServiceSettings::from_env_profiled(&profile);
    if let Some(region) = args.region {
        service_settings = service_settings.with_region(region);
    }
    let client = ConfigServiceClient::new(service_settings).await;

    let pipeline = RulePipeline::from_boxed(samples::build_rule(args.rule), settings);
    info!(rule = pipeline.rule().name(), "Running invocation");

    let result = pipeline
        .run(&event, Collaborators::new(&client, &client))
        .await;

    match result {
        Ok(outcome) => {
            let json = serde_json::to_string_pretty(&outcome)
                .context("failed to serialize invocation outcome")?;
            println!("{json}");
            Ok(())
        }
        Err(PipelineError::PartialReportFailure { outcome }) => {
            let json = serde_json::to_string_pretty(&outcome)
                .context("failed to serialize report outcome")?;
            println!("{json}");
            anyhow::bail!(
                "{} evaluation(s) rejected by the aggregator",
                outcome.failed_evaluations.len()
            )
        }
        Err(e) => {
            error!(kind = e.kind(), "Invocation did not complete");
            Err(e).context("invocation failed")
        }
    }
}
