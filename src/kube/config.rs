//! Cluster connection settings.
//!
//! Settings come from a kubeconfig file (YAML, or its JSON form) or, inside a
//! pod, from the mounted service account. The kubeconfig is located in
//! priority order:
//! 1. `--kubeconfig` flag
//! 2. `KUBECONFIG` environment variable (first entry)
//! 3. `~/.kube/config`
use super::exec::{exec_token, ExecConfig};
use anyhow::{anyhow, Context, Result};
use base64::Engine as _;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// Everything needed to talk to one API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    pub server: String,
    pub auth: Auth,
    pub tls: TlsSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Auth {
    #[default]
    None,
    Bearer(String),
    Basic {
        username: String,
        password: String,
    },
}

impl Auth {
    /// Value for the `Authorization` header, if any.
    pub fn header_value(&self) -> Option<String> {
        match self {
            Auth::None => None,
            Auth::Bearer(token) => Some(format!("Bearer {token}")),
            Auth::Basic { username, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{password}"));
                Some(format!("Basic {encoded}"))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsSettings {
    /// PEM bundle trusted instead of the platform roots.
    pub ca_pem: Option<Vec<u8>>,
    pub client_identity: Option<ClientIdentity>,
    pub insecure_skip_verify: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub cert_pem: Vec<u8>,
    pub key_pem: Vec<u8>,
}

/// Resolve connection settings from flags, environment, or the pod.
pub fn resolve_cluster_config(
    kubeconfig: Option<&Path>,
    context: Option<&str>,
) -> Result<ClusterConfig> {
    if let Some(path) = kubeconfig {
        return load_kubeconfig(path, context);
    }
    if let Some(path) = kubeconfig_from_env() {
        return load_kubeconfig(&path, context);
    }
    if let Some(path) = dirs::home_dir().map(|home| home.join(".kube").join("config")) {
        if path.is_file() {
            return load_kubeconfig(&path, context);
        }
    }
    if let Some(config) = in_cluster_config()? {
        return Ok(config);
    }
    Err(anyhow!(
        "no kubeconfig found; pass --kubeconfig, set KUBECONFIG, or use --input"
    ))
}

fn kubeconfig_from_env() -> Option<PathBuf> {
    let raw = env::var_os("KUBECONFIG")?;
    env::split_paths(&raw).find(|path| !path.as_os_str().is_empty())
}

/// Load a kubeconfig file and select `context` (or its current context).
pub fn load_kubeconfig(path: &Path, context: Option<&str>) -> Result<ClusterConfig> {
    let bytes = fs::read(path).with_context(|| format!("read kubeconfig {}", path.display()))?;
    let document: Kubeconfig = serde_yaml::from_slice(&bytes)
        .with_context(|| format!("parse kubeconfig {}", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let config = cluster_config_from_kubeconfig(&document, base_dir, context)?;
    tracing::debug!(kubeconfig = %path.display(), server = %config.server, "loaded kubeconfig");
    Ok(config)
}

fn in_cluster_config() -> Result<Option<ClusterConfig>> {
    let (Ok(host), Ok(port)) = (
        env::var("KUBERNETES_SERVICE_HOST"),
        env::var("KUBERNETES_SERVICE_PORT"),
    ) else {
        return Ok(None);
    };
    let dir = Path::new(SERVICE_ACCOUNT_DIR);
    let token = read_token_file(&dir.join("token"))?;
    let ca_path = dir.join("ca.crt");
    let ca_pem = if ca_path.is_file() {
        Some(fs::read(&ca_path).with_context(|| format!("read {}", ca_path.display()))?)
    } else {
        None
    };
    let server = if host.contains(':') {
        format!("https://[{host}]:{port}")
    } else {
        format!("https://{host}:{port}")
    };
    tracing::debug!(server = %server, "using in-cluster service account");
    Ok(Some(ClusterConfig {
        server,
        auth: Auth::Bearer(token),
        tls: TlsSettings {
            ca_pem,
            ..TlsSettings::default()
        },
    }))
}

#[derive(Debug, Deserialize)]
struct Kubeconfig {
    #[serde(default, rename = "current-context")]
    current_context: Option<String>,
    #[serde(default)]
    contexts: Vec<Named<ContextEntry>>,
    #[serde(default)]
    clusters: Vec<Named<ClusterEntry>>,
    #[serde(default)]
    users: Vec<Named<UserEntry>>,
}

#[derive(Debug, Deserialize)]
struct Named<T> {
    name: String,
    #[serde(alias = "context", alias = "cluster", alias = "user")]
    value: T,
}

#[derive(Debug, Deserialize)]
struct ContextEntry {
    cluster: String,
    #[serde(default)]
    user: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ClusterEntry {
    server: String,
    #[serde(default)]
    certificate_authority: Option<PathBuf>,
    #[serde(default)]
    certificate_authority_data: Option<String>,
    #[serde(default)]
    insecure_skip_tls_verify: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct UserEntry {
    #[serde(default)]
    token: Option<String>,
    #[serde(default, rename = "tokenFile")]
    token_file: Option<PathBuf>,
    #[serde(default)]
    client_certificate: Option<PathBuf>,
    #[serde(default)]
    client_certificate_data: Option<String>,
    #[serde(default)]
    client_key: Option<PathBuf>,
    #[serde(default)]
    client_key_data: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    exec: Option<ExecConfig>,
    #[serde(default)]
    auth_provider: Option<AuthProviderEntry>,
}

#[derive(Debug, Deserialize)]
struct AuthProviderEntry {
    name: String,
}

fn find<'a, T>(entries: &'a [Named<T>], name: &str, kind: &str) -> Result<&'a T> {
    entries
        .iter()
        .find(|entry| entry.name == name)
        .map(|entry| &entry.value)
        .ok_or_else(|| anyhow!("{kind} {name:?} not found in kubeconfig"))
}

fn cluster_config_from_kubeconfig(
    document: &Kubeconfig,
    base_dir: &Path,
    context: Option<&str>,
) -> Result<ClusterConfig> {
    let context_name = context
        .or(document.current_context.as_deref())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| anyhow!("kubeconfig has no current-context; pass --context"))?;
    let context = find(&document.contexts, context_name, "context")?;
    let cluster = find(&document.clusters, &context.cluster, "cluster")?;
    let default_user = UserEntry::default();
    let user_name = context.user.as_deref().unwrap_or_default();
    let user = if user_name.is_empty() {
        &default_user
    } else {
        find(&document.users, user_name, "user")?
    };

    let ca_pem = inline_or_file(
        cluster.certificate_authority_data.as_deref(),
        cluster.certificate_authority.as_deref(),
        base_dir,
        "certificate-authority",
    )?;
    let cert_pem = inline_or_file(
        user.client_certificate_data.as_deref(),
        user.client_certificate.as_deref(),
        base_dir,
        "client-certificate",
    )?;
    let key_pem = inline_or_file(
        user.client_key_data.as_deref(),
        user.client_key.as_deref(),
        base_dir,
        "client-key",
    )?;
    let client_identity = match (cert_pem, key_pem) {
        (Some(cert_pem), Some(key_pem)) => Some(ClientIdentity { cert_pem, key_pem }),
        (None, None) => None,
        _ => {
            return Err(anyhow!(
                "user in context {context_name:?} needs both a client certificate and key"
            ))
        }
    };

    Ok(ClusterConfig {
        server: cluster.server.trim_end_matches('/').to_string(),
        auth: user_auth(user_name, user, base_dir)?,
        tls: TlsSettings {
            ca_pem,
            client_identity,
            insecure_skip_verify: cluster.insecure_skip_tls_verify,
        },
    })
}

fn user_auth(name: &str, user: &UserEntry, base_dir: &Path) -> Result<Auth> {
    if let Some(token) = user.token.as_deref().filter(|token| !token.is_empty()) {
        return Ok(Auth::Bearer(token.to_string()));
    }
    if let Some(path) = &user.token_file {
        return Ok(Auth::Bearer(read_token_file(&base_dir.join(path))?));
    }
    if let Some(exec) = &user.exec {
        return Ok(Auth::Bearer(exec_token(name, exec, base_dir)?));
    }
    if let (Some(username), Some(password)) = (&user.username, &user.password) {
        return Ok(Auth::Basic {
            username: username.clone(),
            password: password.clone(),
        });
    }
    if let Some(provider) = &user.auth_provider {
        return Err(anyhow!(
            "user {name:?} authenticates with the {:?} auth-provider, which is not supported; \
             configure an exec credential plugin instead",
            provider.name
        ));
    }
    Ok(Auth::None)
}

fn read_token_file(path: &Path) -> Result<String> {
    let token =
        fs::read_to_string(path).with_context(|| format!("read token {}", path.display()))?;
    Ok(token.trim().to_string())
}

fn inline_or_file(
    data: Option<&str>,
    path: Option<&Path>,
    base_dir: &Path,
    field: &str,
) -> Result<Option<Vec<u8>>> {
    if let Some(data) = data.filter(|data| !data.is_empty()) {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(data.trim())
            .with_context(|| format!("decode {field}-data"))?;
        return Ok(Some(decoded));
    }
    match path {
        Some(path) => {
            let path = base_dir.join(path);
            let bytes = fs::read(&path)
                .with_context(|| format!("read {field} {}", path.display()))?;
            Ok(Some(bytes))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
