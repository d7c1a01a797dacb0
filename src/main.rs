use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod cli;
mod evaluate;
mod kube;
mod labels;
mod naming;
mod version;
mod workload;

use cli::RootArgs;
use workload::WorkloadRecord;

type Records = Box<dyn Iterator<Item = Result<WorkloadRecord>>>;

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    let records = open_records(&args)?;
    let stdout = io::stdout();
    let mut sink = BufWriter::new(stdout.lock());
    let summary = evaluate::run(records, &args.report_options(), &mut sink)?;
    tracing::info!(
        emitted = summary.emitted,
        no_version = summary.no_version,
        mismatched = summary.mismatched,
        "report complete"
    );
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open_records(args: &RootArgs) -> Result<Records> {
    if let Some(input) = &args.input {
        let records = read_input(input)?;
        tracing::debug!(input = %input.display(), records = records.len(), "read deployment list");
        return Ok(Box::new(records.into_iter().map(Ok::<_, anyhow::Error>)));
    }
    let config = kube::resolve_cluster_config(args.kubeconfig.as_deref(), args.context.as_deref())?;
    let client = kube::Client::new(&config).context("build API client")?;
    Ok(Box::new(
        client.deployments(args.namespace.as_deref(), args.page_size),
    ))
}

fn read_input(path: &Path) -> Result<Vec<WorkloadRecord>> {
    if path == Path::new("-") {
        return workload::read_deployment_list(io::stdin().lock());
    }
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    workload::read_deployment_list(BufReader::new(file))
        .with_context(|| format!("read {}", path.display()))
}
