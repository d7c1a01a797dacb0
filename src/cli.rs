//! CLI argument parsing.
//!
//! The CLI only selects where workloads come from and how results are
//! written; name and version rules live in the evaluation modules.
use crate::evaluate::{OutputFormat, ReportOptions, SecondaryMatch};
use crate::kube::DEFAULT_PAGE_SIZE;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "kver",
    version,
    about = "Print canonical component names and versions of cluster deployments",
    after_help = "Examples:\n  kver\n  kver --debug --namespace monitoring\n  kubectl get deploy -A -o json | kver --input -\n  kver --format json --secondary-match off"
)]
pub struct RootArgs {
    /// Also print a line for every skipped deployment
    #[arg(long)]
    pub debug: bool,

    /// Path to a kubeconfig in JSON form (defaults to $KUBECONFIG, then ~/.kube/config)
    #[arg(long, value_name = "PATH", conflicts_with = "input")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use instead of current-context
    #[arg(long, value_name = "NAME", conflicts_with = "input")]
    pub context: Option<String>,

    /// Only list deployments in this namespace (default: all namespaces)
    #[arg(
        long,
        short = 'n',
        value_name = "NS",
        conflicts_with = "input",
        value_parser = parse_namespace
    )]
    pub namespace: Option<String>,

    /// Read a DeploymentList JSON document instead of querying a cluster ("-" for stdin)
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Secondary identifier accepted for a primary component
    #[arg(long, value_enum, default_value_t = SecondaryMatch::InstanceComponent)]
    pub secondary_match: SecondaryMatch,

    /// Deployments requested per API page
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_PAGE_SIZE,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub page_size: u32,

    /// Emit debug logs on stderr
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl RootArgs {
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            debug: self.debug,
            format: self.format,
            secondary: self.secondary_match,
        }
    }
}

/// Namespaces are DNS-1123 labels; anything else would change the request path.
fn parse_namespace(raw: &str) -> Result<String, String> {
    let valid_chars = raw
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if raw.is_empty()
        || raw.len() > 63
        || !valid_chars
        || raw.starts_with('-')
        || raw.ends_with('-')
    {
        return Err(format!(
            "{raw:?} is not a valid namespace (lowercase letters, digits and '-', at most 63 characters)"
        ));
    }
    Ok(raw.to_string())
}
