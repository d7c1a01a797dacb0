//! Workload records and the subset of the `apps/v1` list schema they decode from.
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;

/// A retrieved workload: its own name plus its labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkloadRecord {
    pub name: String,
    pub namespace: Option<String>,
    pub labels: BTreeMap<String, String>,
}

impl WorkloadRecord {
    #[cfg(test)]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }

    /// Label value, or the empty string when absent.
    pub fn label(&self, key: &str) -> &str {
        self.labels.get(key).map(String::as_str).unwrap_or_default()
    }
}

/// `DeploymentList` as returned by the API server or `kubectl get -o json`.
#[derive(Debug, Deserialize)]
pub struct DeploymentList {
    #[serde(default)]
    pub items: Vec<Deployment>,
    #[serde(default)]
    pub metadata: ListMeta,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListMeta {
    #[serde(default, rename = "continue")]
    pub continue_token: Option<String>,
}

impl ListMeta {
    /// Continue token for the next page, if the list is not exhausted.
    pub fn next_page(&self) -> Option<&str> {
        self.continue_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct Deployment {
    pub metadata: ObjectMeta,
}

#[derive(Debug, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub labels: Option<BTreeMap<String, String>>,
}

impl From<Deployment> for WorkloadRecord {
    fn from(deployment: Deployment) -> Self {
        let ObjectMeta {
            name,
            namespace,
            labels,
        } = deployment.metadata;
        Self {
            name,
            namespace,
            labels: labels.unwrap_or_default(),
        }
    }
}

/// Decode a `DeploymentList` JSON document into records, in list order.
pub fn read_deployment_list<R: Read>(reader: R) -> Result<Vec<WorkloadRecord>> {
    let list: DeploymentList =
        serde_json::from_reader(reader).context("parse deployment list JSON")?;
    Ok(list.items.into_iter().map(WorkloadRecord::from).collect())
}
