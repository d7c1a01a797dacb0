//! Paginated deployment listing over the Kubernetes REST API.
use super::config::{ClusterConfig, TlsSettings};
use crate::workload::{DeploymentList, WorkloadRecord};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use ureq::tls::{parse_pem, Certificate, ClientCert, PemItem, PrivateKey, RootCerts, TlsConfig};

pub const DEFAULT_PAGE_SIZE: u32 = 250;

const MAX_PAGE_BYTES: u64 = 64 * 1024 * 1024;

/// Minimal HTTP client for one API server.
pub struct Client {
    agent: ureq::Agent,
    server: String,
    authorization: Option<String>,
}

impl Client {
    pub fn new(config: &ClusterConfig) -> Result<Self> {
        Ok(Self {
            agent: build_agent(&config.tls)?,
            server: config.server.trim_end_matches('/').to_string(),
            authorization: config.auth.header_value(),
        })
    }

    /// Lazily list deployments in `namespace`, or in all namespaces.
    pub fn deployments(self, namespace: Option<&str>, page_size: u32) -> DeploymentPages {
        let url = match namespace {
            Some(namespace) => format!(
                "{}/apis/apps/v1/namespaces/{namespace}/deployments",
                self.server
            ),
            None => format!("{}/apis/apps/v1/deployments", self.server),
        };
        DeploymentPages {
            client: self,
            url,
            page_size: page_size.max(1),
            buffered: VecDeque::new(),
            next: PageCursor::First,
        }
    }

    fn fetch_page(
        &self,
        url: &str,
        limit: u32,
        continue_token: Option<&str>,
    ) -> Result<DeploymentList> {
        let mut request = self.agent.get(url).query("limit", limit.to_string());
        if let Some(token) = continue_token {
            request = request.query("continue", token);
        }
        if let Some(authorization) = &self.authorization {
            request = request.header("Authorization", authorization);
        }
        let mut response = request
            .header("Accept", "application/json")
            .call()
            .with_context(|| format!("GET {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.body_mut().read_to_string().unwrap_or_default();
            return Err(anyhow!(
                "GET {url} returned {}: {}",
                status.as_u16(),
                status_message(&body)
            ));
        }
        response
            .body_mut()
            .with_config()
            .limit(MAX_PAGE_BYTES)
            .read_json()
            .with_context(|| format!("decode deployment list from {url}"))
    }
}

/// Body of a non-2xx API response.
#[derive(Deserialize)]
struct ApiStatus {
    #[serde(default)]
    message: String,
}

fn status_message(body: &str) -> String {
    match serde_json::from_str::<ApiStatus>(body) {
        Ok(status) if !status.message.is_empty() => status.message,
        _ => body.trim().to_string(),
    }
}

enum PageCursor {
    First,
    Continue(String),
    Done,
}

/// Iterator over deployments that fetches one page at a time.
///
/// Yields an error at most once; iteration stops after it.
pub struct DeploymentPages {
    client: Client,
    url: String,
    page_size: u32,
    buffered: VecDeque<WorkloadRecord>,
    next: PageCursor,
}

impl Iterator for DeploymentPages {
    type Item = Result<WorkloadRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.buffered.pop_front() {
                return Some(Ok(record));
            }
            let continue_token = match std::mem::replace(&mut self.next, PageCursor::Done) {
                PageCursor::Done => return None,
                PageCursor::First => None,
                PageCursor::Continue(token) => Some(token),
            };
            let page = match self
                .client
                .fetch_page(&self.url, self.page_size, continue_token.as_deref())
            {
                Ok(page) => page,
                Err(err) => return Some(Err(err)),
            };
            tracing::debug!(
                url = %self.url,
                items = page.items.len(),
                more = page.metadata.next_page().is_some(),
                "fetched deployment page"
            );
            if let Some(token) = page.metadata.next_page() {
                self.next = PageCursor::Continue(token.to_string());
            }
            self.buffered
                .extend(page.items.into_iter().map(WorkloadRecord::from));
        }
    }
}

fn build_agent(tls: &TlsSettings) -> Result<ureq::Agent> {
    let mut builder = TlsConfig::builder().disable_verification(tls.insecure_skip_verify);
    if let Some(pem) = &tls.ca_pem {
        let roots = parse_certificates(pem).context("parse certificate authority")?;
        builder = builder.root_certs(RootCerts::Specific(Arc::new(roots)));
    }
    if let Some(identity) = &tls.client_identity {
        let chain = parse_certificates(&identity.cert_pem).context("parse client certificate")?;
        let key = PrivateKey::from_pem(&identity.key_pem)
            .context("parse client key")?
            .to_owned();
        builder = builder.client_cert(Some(ClientCert::new_with_certs(&chain, key)));
    }
    let config = ureq::Agent::config_builder()
        .tls_config(builder.build())
        .http_status_as_error(false)
        .build();
    Ok(config.into())
}

fn parse_certificates(pem: &[u8]) -> Result<Vec<Certificate<'static>>> {
    let mut certs = Vec::new();
    for item in parse_pem(pem) {
        if let PemItem::Certificate(cert) = item? {
            certs.push(cert.to_owned());
        }
    }
    if certs.is_empty() {
        return Err(anyhow!("no PEM certificates found"));
    }
    Ok(certs)
}
