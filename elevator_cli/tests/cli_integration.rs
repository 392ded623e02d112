use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Three-floor config tuned so the sim car settles quickly
fn write_config(dir: &tempfile::TempDir, motion_extra: &str) -> PathBuf {
    let toml = format!(
        r#"
[motion]
min_height_mm = 50
max_height_mm = 600
setpoint_tolerance_mm = 5
gain = 8.0
dampener = 1.0
diff_max_mm = 500
{motion_extra}

[[floors]]
code = 0x05
setpoint_mm = 100
label = "Floor 1"

[[floors]]
code = 0x06
setpoint_mm = 300
label = "Floor 2"

[[floors]]
code = 0x07
setpoint_mm = 500
label = "Floor 3"

[timer]
transmit_interval_ms = 20

[sensor]
# no settling delay in tests
settle_ms = 0

[sim]
mm_per_level = 0.02
"#
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn elevator(cfg: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("elevator_cli").unwrap();
    cmd.env_remove("ELEVATOR_SIM_SENSOR_FAULT")
        .env_remove("ELEVATOR_SIM_SEND_FAULT")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(cfg);
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["run", "--cycles", "80", "--request", "0x06"], 0, "Destination: Floor 2", "stdout")]
#[case(&["run", "--cycles", "3"], 0, "Current floor: Floor 1 (0x05)", "stdout")]
#[case(&["run", "--request", "lobby"], 2, "invalid floor code", "stderr")]
#[case(&["floors"], 0, "Floor 3", "stdout")]
#[case(&["self-check"], 0, "self-check ok", "stdout")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let mut cmd = elevator(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn json_run_prints_summary() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let out = elevator(&cfg)
        .args(["--json", "run", "--cycles", "5"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    let line = stdout.lines().last().unwrap();
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["cycles"], 5);
    assert_eq!(v["setpoint_mm"], 100);
    assert_eq!(v["floor_label"], "Floor 1");
}

#[rstest]
fn floors_listing_marks_default() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "default_floor = 0x06");

    elevator(&cfg)
        .arg("floors")
        .assert()
        .success()
        .stdout(predicate::str::contains("* 0x06"));
}

#[rstest]
fn sensor_fault_fails_self_check_with_timeout_code() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    elevator(&cfg)
        .env("ELEVATOR_SIM_SENSOR_FAULT", "1")
        .arg("self-check")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Distance sensor read timed out"));
}

#[rstest]
fn sensor_fault_json_error_goes_to_stdout() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let out = elevator(&cfg)
        .env("ELEVATOR_SIM_SENSOR_FAULT", "1")
        .args(["--json", "self-check"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));

    let stdout = String::from_utf8(out.stdout).unwrap();
    let line = stdout.lines().last().unwrap();
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["reason"], "Timeout");
    assert_eq!(v["exit_code"], 3);
}

#[rstest]
fn cli_reports_bad_floors_header() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let bad_csv = dir.path().join("floors.csv");
    let mut f = fs::File::create(&bad_csv).unwrap();
    writeln!(f, "id,height").unwrap();
    writeln!(f, "0x05,100").unwrap();

    elevator(&cfg)
        .arg("--floors")
        .arg(&bad_csv)
        .arg("floors")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid headers"));
}

#[rstest]
fn floors_csv_replaces_table() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let csv = dir.path().join("floors.csv");
    let mut f = fs::File::create(&csv).unwrap();
    writeln!(f, "code,setpoint_mm,label").unwrap();
    writeln!(f, "0x05,100,Ground").unwrap();
    writeln!(f, "0x08,550,Roof").unwrap();

    elevator(&cfg)
        .arg("--floors")
        .arg(&csv)
        .arg("floors")
        .assert()
        .success()
        .stdout(predicate::str::contains("Roof"))
        .stdout(predicate::str::contains("Floor 2").not());
}

#[rstest]
#[case("gain = 0.0")]
#[case("default_floor = 0x09")]
fn invalid_config_is_rejected(#[case] extra: &str) {
    let dir = tempdir().unwrap();
    // Replace the valid gain rather than duplicating the key
    let cfg = write_config(&dir, "");
    let text = fs::read_to_string(&cfg).unwrap();
    let text = if extra.starts_with("gain") {
        text.replace("gain = 8.0", extra)
    } else {
        text.replace("diff_max_mm = 500", &format!("diff_max_mm = 500\n{extra}"))
    };
    fs::write(&cfg, text).unwrap();

    elevator(&cfg)
        .arg("self-check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration is invalid"));
}

#[rstest]
fn missing_config_file_is_explained() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    elevator(&missing)
        .arg("floors")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not read the config file"));
}
