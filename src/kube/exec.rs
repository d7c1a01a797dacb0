//! Exec credential plugins (`users[].user.exec` in a kubeconfig).
//!
//! The plugin is run once when the kubeconfig is loaded and must print an
//! `ExecCredential` object carrying `status.token` on stdout.
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

const DEFAULT_EXEC_API_VERSION: &str = "client.authentication.k8s.io/v1beta1";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ExecConfig {
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: Vec<ExecEnvVar>,
    #[serde(default)]
    api_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExecEnvVar {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct ExecCredential {
    #[serde(default)]
    status: Option<ExecCredentialStatus>,
}

#[derive(Debug, Deserialize)]
struct ExecCredentialStatus {
    #[serde(default)]
    token: Option<String>,
}

/// Run the plugin configured for `user` and return its bearer token.
pub(super) fn exec_token(user: &str, exec: &ExecConfig, base_dir: &Path) -> Result<String> {
    let program = plugin_path(&exec.command, base_dir);
    let api_version = exec
        .api_version
        .as_deref()
        .unwrap_or(DEFAULT_EXEC_API_VERSION);
    let exec_info = serde_json::json!({
        "apiVersion": api_version,
        "kind": "ExecCredential",
        "spec": {"interactive": false}
    });

    let mut command = Command::new(&program);
    command
        .args(&exec.args)
        .env("KUBERNETES_EXEC_INFO", exec_info.to_string())
        .stdin(Stdio::null());
    for var in &exec.env {
        command.env(&var.name, &var.value);
    }
    let output = command.output().with_context(|| {
        format!(
            "run exec credential plugin {} for user {user:?}",
            program.display()
        )
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.trim().lines().next().unwrap_or_default().to_string();
        return Err(anyhow!(
            "exec credential plugin {} for user {user:?} failed with {}: {detail}",
            program.display(),
            output.status
        ));
    }

    let credential: ExecCredential = serde_json::from_slice(&output.stdout)
        .with_context(|| format!("parse ExecCredential from plugin for user {user:?}"))?;
    let token = credential
        .status
        .and_then(|status| status.token)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            anyhow!("exec credential plugin for user {user:?} returned no status.token")
        })?;
    tracing::debug!(user, plugin = %program.display(), "obtained token from exec plugin");
    Ok(token)
}

/// Commands containing a path separator resolve against the kubeconfig
/// directory; bare names are looked up on `PATH`.
fn plugin_path(command: &str, base_dir: &Path) -> PathBuf {
    let path = Path::new(command);
    if path.is_relative() && path.components().count() > 1 {
        return base_dir.join(path);
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_plugin_paths_resolve_against_kubeconfig_dir() {
        let base = Path::new("/etc/kube");
        assert_eq!(
            plugin_path("./bin/token-helper", base),
            Path::new("/etc/kube/./bin/token-helper")
        );
        assert_eq!(plugin_path("aws", base), Path::new("aws"));
        assert_eq!(
            plugin_path("/usr/bin/gke-gcloud-auth-plugin", base),
            Path::new("/usr/bin/gke-gcloud-auth-plugin")
        );
    }
}
