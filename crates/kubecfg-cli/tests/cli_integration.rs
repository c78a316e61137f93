//! CLI subprocess integration tests.
//!
//! These tests invoke the `kubecfg` binary as a subprocess and verify exit
//! codes, stdout/stderr content, and the kubeconfig left on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const KUBECONFIG: &str = r"apiVersion: v1
kind: Config
preferences: {}
clusters:
- name: dev-cluster
  cluster:
    server: https://dev.example.com:6443
users:
- name: admin
  user:
    token: s3cr3t
contexts:
- name: dev
  context:
    cluster: dev-cluster
    user: admin
- name: prod
  context:
    cluster: dev-cluster
    user: admin
current-context: dev
";

fn kubecfg_bin(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_kubecfg"));
    // Never let a test touch the developer's real kubeconfig.
    cmd.env("HOME", home);
    cmd.env_remove("KUBECONFIG");
    cmd.env_remove("KUBECFG_LOG");
    cmd
}

fn write_kubeconfig(dir: &Path) -> PathBuf {
    let path = dir.join("config");
    fs::write(&path, KUBECONFIG).unwrap();
    path
}

fn rename(home: &Path, kubeconfig: &Path, args: &[&str]) -> Output {
    kubecfg_bin(home)
        .arg("--kubeconfig")
        .arg(kubeconfig)
        .args(["config", "rename-context"])
        .args(args)
        .output()
        .unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn cli_version_exits_zero() {
    let home = tempfile::tempdir().unwrap();
    let output = kubecfg_bin(home.path()).arg("--version").output().unwrap();
    assert!(output.status.success(), "kubecfg --version must exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("kubecfg"), "version output: {stdout}");
}

#[test]
fn cli_rename_context_help_shows_examples() {
    let home = tempfile::tempdir().unwrap();
    let output = kubecfg_bin(home.path())
        .args(["config", "rename-context", "--help"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("CONTEXT_NAME NEW_NAME"));
    assert!(stdout.contains("kubecfg config rename-context old-name new-name"));
}

#[test]
fn cli_rename_prints_confirmation_and_rewrites_file() {
    let home = tempfile::tempdir().unwrap();
    let path = write_kubeconfig(home.path());

    let output = rename(home.path(), &path, &["dev", "staging"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Context \"dev\" renamed to \"staging\".\n"
    );

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("name: staging"));
    assert!(!written.contains("name: dev\n"));
    assert!(written.contains("current-context: staging"));
    assert!(written.contains("token: s3cr3t"));
}

#[test]
fn cli_rename_json_output() {
    let home = tempfile::tempdir().unwrap();
    let path = write_kubeconfig(home.path());

    let output = kubecfg_bin(home.path())
        .arg("--kubeconfig")
        .arg(&path)
        .args(["--json", "config", "rename-context", "prod", "production"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["context_name"], "prod");
    assert_eq!(json["new_name"], "production");
    assert_eq!(json["current_context_updated"], false);
    assert_eq!(json["file"], path.display().to_string());
}

#[test]
fn cli_wrong_arg_count_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    let path = write_kubeconfig(home.path());

    let output = rename(home.path(), &path, &["dev", "staging", "extra"]);
    assert_eq!(output.status.code(), Some(2));
    let err = stderr(&output);
    assert!(err.contains("Unexpected args: [dev staging extra]"), "{err}");
    assert!(err.contains("for help and examples"));
    assert_eq!(fs::read_to_string(&path).unwrap(), KUBECONFIG);
}

#[test]
fn cli_empty_new_name_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let path = write_kubeconfig(home.path());

    let output = rename(home.path(), &path, &["dev", ""]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("You must specify a new non-empty context name"));
    assert_eq!(fs::read_to_string(&path).unwrap(), KUBECONFIG);
}

#[test]
fn cli_missing_context_names_file() {
    let home = tempfile::tempdir().unwrap();
    let path = write_kubeconfig(home.path());

    let output = rename(home.path(), &path, &["qa", "staging"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains(&format!(
        "error: cannot rename the context \"qa\", it's not in {}",
        path.display()
    )));
    assert_eq!(fs::read_to_string(&path).unwrap(), KUBECONFIG);
}

#[test]
fn cli_existing_destination_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let path = write_kubeconfig(home.path());

    let output = rename(home.path(), &path, &["dev", "prod"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("the context \"prod\" already exists in"));
    assert_eq!(fs::read_to_string(&path).unwrap(), KUBECONFIG);
}

#[test]
fn cli_missing_explicit_file_is_config_error() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("does-not-exist");

    let output = rename(home.path(), &path, &["dev", "staging"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("no such file or directory"));
}

#[test]
fn cli_uses_kubeconfig_env_var() {
    let home = tempfile::tempdir().unwrap();
    let path = write_kubeconfig(home.path());

    let output = kubecfg_bin(home.path())
        .env("KUBECONFIG", &path)
        .args(["config", "rename-context", "dev", "staging"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(fs::read_to_string(&path)
        .unwrap()
        .contains("current-context: staging"));
}

#[test]
fn cli_defaults_to_home_kubeconfig() {
    let home = tempfile::tempdir().unwrap();
    let kube_dir = home.path().join(".kube");
    fs::create_dir_all(&kube_dir).unwrap();
    let path = write_kubeconfig(&kube_dir);

    let output = kubecfg_bin(home.path())
        .args(["config", "rename-context", "prod", "production"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(fs::read_to_string(&path)
        .unwrap()
        .contains("name: production"));
    assert!(!kube_dir.join("config.lock").exists());
}

#[test]
fn cli_man_pages_written() {
    let home = tempfile::tempdir().unwrap();
    let out = home.path().join("man");

    let output = kubecfg_bin(home.path())
        .arg("man-pages")
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(out.join("kubecfg.1").exists());
    assert!(out.join("kubecfg-config.1").exists());
    assert!(out.join("kubecfg-config-rename-context.1").exists());
}

#[test]
fn cli_completions_generated() {
    let home = tempfile::tempdir().unwrap();
    let output = kubecfg_bin(home.path())
        .args(["completions", "bash"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let script = String::from_utf8_lossy(&output.stdout);
    assert!(script.contains("rename-context"));
    assert!(script.contains("--kubeconfig"));
}
