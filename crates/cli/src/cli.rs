use clap::{Parser, ValueEnum};

/// Run one compliance-rule invocation locally.
///
/// Reads an inbound rule event, evaluates it with a built-in sample rule and
/// submits the resulting evaluations to AWS Config.
#[derive(Parser, Debug)]
#[command(name = "confcheck", about = "Run one AWS Config rule invocation locally")]
pub struct CliArgs {
    /// Path to the inbound event JSON, or `-` for stdin
    #[arg(long, short, default_value = "-")]
    pub event: String,

    /// Sample rule to evaluate with
    #[arg(long, value_enum, default_value_t = SampleRule::Placeholder)]
    pub rule: SampleRule,

    /// Submit in test mode (validated by the aggregator, not recorded)
    #[arg(long)]
    pub test_mode: bool,

    /// AWS region override (otherwise CONFIG_REGION / AWS_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Env profile: PROD makes PROD_<KEY> win over <KEY>
    #[arg(long, env = "CONFCHECK_PROFILE", default_value = "")]
    pub profile: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SampleRule {
    /// Always NOT_APPLICABLE
    Placeholder,
    /// EC2 instances must match the `ebsOptimized` parameter
    EbsOptimized,
}
