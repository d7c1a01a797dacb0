mod common;

use common::{deployment, deployment_list, run_kver, stdout_text, write_json};

fn sample_list() -> serde_json::Value {
    deployment_list(
        vec![
            deployment(
                "app",
                &[("instance", "app"), ("name", "app"), ("version", "v1.0.0")],
            ),
            deployment(
                "app-db",
                &[("instance", "app"), ("name", "db"), ("version", "version-2")],
            ),
            deployment(
                "app-cache",
                &[("instance", "app"), ("name", "db"), ("version", "v1")],
            ),
            deployment("sidecar", &[("instance", "app"), ("name", "sidecar")]),
            deployment(
                "app-queue",
                &[
                    ("instance", "app"),
                    ("name", "rabbitmq"),
                    ("component", "queue"),
                    ("version", "3.12"),
                ],
            ),
        ],
        None,
    )
}

#[test]
fn prints_primary_components_from_input_file() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let input = write_json(dir.path(), "deployments.json", &sample_list());

    let output = run_kver(&["--input", input.to_str().expect("utf8 path")], None);
    assert!(output.status.success(), "kver failed: {output:?}");
    assert_eq!(
        stdout_text(&output),
        "app 1.0.0\napp-db 2\napp-rabbitmq 3.12\n"
    );
}

#[test]
fn debug_flag_adds_skip_diagnostics() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let input = write_json(dir.path(), "deployments.json", &sample_list());

    let output = run_kver(
        &["--debug", "--input", input.to_str().expect("utf8 path")],
        None,
    );
    assert!(output.status.success(), "kver failed: {output:?}");
    assert_eq!(
        stdout_text(&output),
        "app 1.0.0\n\
         app-db 2\n\
         app-cache mismatch for app-db\n\
         sidecar has no version\n\
         app-rabbitmq 3.12\n"
    );
}

#[test]
fn secondary_match_off_rejects_component_identifiers() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let input = write_json(dir.path(), "deployments.json", &sample_list());

    let output = run_kver(
        &[
            "--secondary-match",
            "off",
            "--input",
            input.to_str().expect("utf8 path"),
        ],
        None,
    );
    assert!(output.status.success(), "kver failed: {output:?}");
    assert_eq!(stdout_text(&output), "app 1.0.0\napp-db 2\n");
}

#[test]
fn reads_deployment_list_from_stdin() {
    let list = sample_list().to_string();
    let output = run_kver(&["--input", "-", "--format", "json"], Some(&list));
    assert!(output.status.success(), "kver failed: {output:?}");

    let lines: Vec<serde_json::Value> = stdout_text(&output)
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[1],
        serde_json::json!({"name": "app-db", "version": "2"})
    );
}

#[test]
fn malformed_input_fails_without_output() {
    let output = run_kver(&["--input", "-"], Some("not json"));
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("parse deployment list JSON"), "{stderr}");
}

#[test]
fn missing_kubeconfig_is_fatal() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let missing = dir.path().join("absent.json");

    let output = run_kver(&["--kubeconfig", missing.to_str().expect("utf8 path")], None);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("read kubeconfig"), "{stderr}");
}
