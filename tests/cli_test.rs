// file: tests/cli_test.rs
// version: 1.0.0
// guid: b7c8d9e0-f1a2-3456-7890-123456bcdef0

//! Command line tests

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const CONFIG: &str = r#"
token: cli-secret-token
os:
  hostname: cli-node
  password: $6$salt$hash
  ntpServers: [pool.ntp.org]
install:
  mode: create
  device: /dev/vda
  managementInterface:
    interface: eth0
  forceGpt: true
"#;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("hci-installer").unwrap();
    cmd.env_remove("HCI_INSTALLER_SETTINGS")
        .env_remove("HCI_INSTALLER_LOG_LEVEL");
    cmd
}

fn write_config(dir: &TempDir, content: &str) -> String {
    let path = dir.path().join("config.yaml");
    fs::write(&path, content).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("partition-size"))
        .stdout(predicate::str::contains("render"));
}

#[test]
fn test_validate_without_host_checks() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, CONFIG);
    cmd()
        .args(["validate", "--skip-host-checks", "--config", &config])
        .assert()
        .success()
        .stdout(predicate::str::contains("configuration is valid"));
}

#[test]
fn test_validate_reports_error() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &CONFIG.replace("mode: create", "mode: join"));
    cmd()
        .args(["validate", "--skip-host-checks", "-c", &config])
        .assert()
        .failure()
        .stderr(predicate::str::contains("server URL must be specified in join mode"));
}

#[test]
fn test_render_install_document() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, CONFIG);
    let output = dir.path().join("out").join("install.yaml");

    cmd()
        .args(["render", "--skip-host-checks", "-c", &config, "-o"])
        .arg(&output)
        .assert()
        .success();

    let yaml = fs::read_to_string(&output).unwrap();
    assert!(yaml.contains("initramfs:"));
    assert!(yaml.contains("rootfs:"));
    assert!(yaml.contains("/etc/rancher/rancherd/config.yaml"));
    assert!(yaml.contains("hostname: cli-node"));
}

#[test]
fn test_render_live_to_stdout() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, CONFIG);
    cmd()
        .args(["render", "--live", "--skip-host-checks", "-c", &config])
        .assert()
        .success()
        .stdout(predicate::str::contains("live:"))
        .stdout(predicate::str::contains("wicked ifreload eth0"));
}

#[test]
fn test_render_needs_interface_name() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        &CONFIG.replace("interface: eth0", "hwAddr: 52:54:00:12:34:56"),
    );
    cmd()
        .args(["render", "--skip-host-checks", "-c", &config])
        .assert()
        .failure()
        .stderr(predicate::str::contains("network interface name is not resolved"));
}

#[test]
fn test_render_expand_env_is_opt_in() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        &CONFIG.replace("hostname: cli-node", "hostname: ${HCI_CLI_HOSTNAME}"),
    );

    cmd()
        .env("HCI_CLI_HOSTNAME", "from-env")
        .args(["render", "--live", "--skip-host-checks", "--expand-env", "-c", &config])
        .assert()
        .success()
        .stdout(predicate::str::contains("hostname: from-env"));

    cmd()
        .env("HCI_CLI_HOSTNAME", "from-env")
        .args(["render", "--live", "--skip-host-checks", "-c", &config])
        .assert()
        .success()
        .stdout(predicate::str::contains("from-env").not());
}

#[test]
fn test_env_output() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, CONFIG);
    cmd()
        .args(["env", "-c", &config])
        .assert()
        .success()
        .stdout(predicate::str::contains("HARVESTER_DEVICE=/dev/vda"))
        .stdout(predicate::str::contains("HARVESTER_FORCE_GPT=true"))
        .stdout(predicate::str::contains("cli-secret-token").not());
}

#[test]
fn test_partition_size() {
    cmd()
        .args(["partition-size", "--disk-size-bytes", "214748364800"])
        .assert()
        .success()
        .stdout(predicate::str::contains("61440 MiB"));

    cmd()
        .args(["partition-size", "--disk-size-bytes", "53687091200"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("disk is too small"));

    cmd()
        .args(["partition-size", "--disk-size-bytes", "214748364800", "--size", "30Ti"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Ti"));
}

#[test]
fn test_cmdline_masks_secrets() {
    cmd()
        .args([
            "cmdline",
            "harvester.token=supersecret harvester.os.hostname=from-kernel harvester.install.automatic",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("hostname: from-kernel"))
        .stdout(predicate::str::contains("automatic: true"))
        .stdout(predicate::str::contains("supersecret").not());
}

#[test]
fn test_missing_config_source() {
    cmd()
        .arg("env")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no configuration given"));
}
