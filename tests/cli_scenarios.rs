use assert_cmd::prelude::*;
use color_eyre::Result;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("bmc.yaml");
    std::fs::write(&path, contents).expect("Failed to write config");
    path
}

fn bmcmux(config: &Path) -> Result<Command> {
    let mut cmd = Command::cargo_bin("bmcmux")?;
    cmd.arg("--config").arg(config);
    Ok(cmd)
}

#[test]
fn test_help_lists_commands() -> Result<()> {
    let output = Command::cargo_bin("bmcmux")?.arg("--help").output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["providers", "power", "boot-device", "bmc-reset", "sel", "nmi", "sol"] {
        assert!(stdout.contains(command), "Missing {} command", command);
    }
    Ok(())
}

#[test]
fn test_missing_config_fails() -> Result<()> {
    let output = bmcmux(Path::new("/nonexistent/bmcmux.yaml"))?
        .arg("providers")
        .output()?;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read config file"), "stderr: {}", stderr);
    Ok(())
}

#[test]
fn test_config_without_providers_fails() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = write_config(&dir, "host: 10.0.0.5\nproviders: []\n");

    let output = bmcmux(&config)?.arg("providers").output()?;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("at least one provider"), "stderr: {}", stderr);
    Ok(())
}

#[test]
fn test_providers_listed_in_preference_order() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = write_config(
        &dir,
        "host: 10.0.0.5\nmac: \"aa:bb:cc:dd:ee:ff\"\nproviders: [ipmitool, wol]\nprefer: wol\n",
    );

    let output = bmcmux(&config)?.arg("providers").output()?;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let listed: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(listed[0]["name"], "wol");
    assert_eq!(listed[0]["protocol"], "wol");
    assert_eq!(listed[1]["name"], "ipmitool");
    assert_eq!(listed[1]["protocol"], "ipmi");
    Ok(())
}

#[test]
fn test_unreachable_providers_fail_to_open() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = write_config(
        &dir,
        "host: 10.0.0.5\nproviders: [ipmitool]\nipmitool_path: /nonexistent/ipmitool\n",
    );

    let output = bmcmux(&config)?.args(["power", "status"]).output()?;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to open any provider"), "stderr: {}", stderr);
    Ok(())
}

#[test]
fn test_missing_capability_reported() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = write_config(
        &dir,
        "host: 127.0.0.1\nmac: \"aa:bb:cc:dd:ee:ff\"\nbroadcast: 127.0.0.1\nproviders: [wol]\n",
    );

    let output = bmcmux(&config)?.args(["power", "status"]).output()?;
    assert!(!output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["ok"], false);
    assert!(report["error"]
        .as_str()
        .unwrap_or_default()
        .contains("no PowerStateGetter implementations found"));
    Ok(())
}
