//! Per-record evaluation and the reporting loop.
//!
//! Each record is evaluated on its own: it either yields a canonical
//! `(name, version)` pair or is skipped as a non-primary sub-component or an
//! unversioned workload. Skips are only written out in debug mode.
use crate::labels;
use crate::naming::resolve_component_name;
use crate::version::normalize_version;
use crate::workload::WorkloadRecord;
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::io::Write;

/// Second identifier a record may carry and still count as primary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SecondaryMatch {
    /// `<instance>-<component>`, only when a component label is present.
    #[default]
    InstanceComponent,
    /// `<component>-<component>`.
    ComponentComponent,
    /// Only the resolved name is accepted.
    Off,
}

impl SecondaryMatch {
    fn candidate(self, record: &WorkloadRecord) -> Option<String> {
        let component = record.label(labels::COMPONENT);
        match self {
            SecondaryMatch::InstanceComponent if !component.is_empty() => Some(format!(
                "{}-{component}",
                record.label(labels::INSTANCE)
            )),
            SecondaryMatch::InstanceComponent | SecondaryMatch::Off => None,
            SecondaryMatch::ComponentComponent => Some(format!("{component}-{component}")),
        }
    }
}

/// Result of evaluating one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Emit { name: String, version: String },
    NoVersion { identifier: String },
    Mismatch { identifier: String, resolved: String },
}

impl Outcome {
    pub fn is_emit(&self) -> bool {
        matches!(self, Outcome::Emit { .. })
    }

    /// Text line for this outcome: `<name> <version>` or a skip diagnostic.
    pub fn render_line(&self) -> String {
        match self {
            Outcome::Emit { name, version } => format!("{name} {version}"),
            Outcome::NoVersion { identifier } => format!("{identifier} has no version"),
            Outcome::Mismatch {
                identifier,
                resolved,
            } => format!("{identifier} mismatch for {resolved}"),
        }
    }

    fn render_json(&self) -> serde_json::Result<String> {
        match self {
            Outcome::Emit { name, version } => serde_json::to_string(&EmitLine { name, version }),
            Outcome::NoVersion { identifier } => serde_json::to_string(&SkipLine {
                identifier,
                skipped: "no_version",
                resolved: None,
            }),
            Outcome::Mismatch {
                identifier,
                resolved,
            } => serde_json::to_string(&SkipLine {
                identifier,
                skipped: "mismatch",
                resolved: Some(resolved),
            }),
        }
    }
}

#[derive(Serialize)]
struct EmitLine<'a> {
    name: &'a str,
    version: &'a str,
}

#[derive(Serialize)]
struct SkipLine<'a> {
    identifier: &'a str,
    skipped: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<&'a str>,
}

/// Decide whether `record` is a primary component and what to report for it.
pub fn evaluate(record: &WorkloadRecord, secondary: SecondaryMatch) -> Outcome {
    let version = record.label(labels::VERSION);
    if version.trim().is_empty() {
        return Outcome::NoVersion {
            identifier: record.name.clone(),
        };
    }

    let resolved = resolve_component_name(
        record.label(labels::INSTANCE),
        record.label(labels::NAME),
    );
    let primary = record.name == resolved
        || secondary
            .candidate(record)
            .is_some_and(|candidate| record.name == candidate);
    if !primary {
        return Outcome::Mismatch {
            identifier: record.name.clone(),
            resolved,
        };
    }

    Outcome::Emit {
        name: resolved,
        version: normalize_version(version),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// Also write skipped records.
    pub debug: bool,
    pub format: OutputFormat,
    pub secondary: SecondaryMatch,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub emitted: usize,
    pub no_version: usize,
    pub mismatched: usize,
}

/// Evaluate every record in order and write the results to `sink`.
///
/// A retrieval error from `records` aborts the run. Lines already written
/// stay written.
pub fn run<I, W>(records: I, options: &ReportOptions, sink: &mut W) -> Result<RunSummary>
where
    I: IntoIterator<Item = Result<WorkloadRecord>>,
    W: Write,
{
    let mut summary = RunSummary::default();
    for record in records {
        let record = record.context("retrieve workloads")?;
        let outcome = evaluate(&record, options.secondary);
        let namespace = record.namespace.as_deref().unwrap_or_default();
        match &outcome {
            Outcome::Emit { name, version } => {
                summary.emitted += 1;
                tracing::debug!(
                    workload = %record.name,
                    namespace,
                    name = %name,
                    version = %version,
                    "primary component"
                );
            }
            Outcome::NoVersion { .. } => {
                summary.no_version += 1;
                tracing::debug!(
                    workload = %record.name,
                    namespace,
                    "skipped: no version label"
                );
            }
            Outcome::Mismatch { resolved, .. } => {
                summary.mismatched += 1;
                tracing::debug!(
                    workload = %record.name,
                    namespace,
                    resolved = %resolved,
                    "skipped: not the primary component"
                );
            }
        }
        if !outcome.is_emit() && !options.debug {
            continue;
        }
        write_outcome(sink, &outcome, options.format)?;
    }
    sink.flush().context("flush output")?;
    Ok(summary)
}

fn write_outcome<W: Write>(sink: &mut W, outcome: &Outcome, format: OutputFormat) -> Result<()> {
    let mut line = match format {
        OutputFormat::Text => outcome.render_line(),
        OutputFormat::Json => outcome.render_json().context("serialize outcome")?,
    };
    line.push('\n');
    sink.write_all(line.as_bytes()).context("write output")?;
    Ok(())
}

#[cfg(test)]
#[path = "evaluate_tests.rs"]
mod tests;
