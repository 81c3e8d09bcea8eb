use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(label: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    path.push(format!("relay_enforce_{label}_{}_{}", std::process::id(), nanos));
    path
}

fn write_temp_file(label: &str, contents: &str) -> PathBuf {
    let path = temp_path(label);
    fs::write(&path, contents).expect("write temp file");
    path
}

const POLICY: &str = r#"# Name: DHCP Relays
"Key","Relays","Exclusions"
"Site-001","10.1.1.1,10.1.1.3","10.9.9.9"
"#;

const IOS_CONFIG: &str = "\
hostname edge-01
!
interface Vlan10
 ip address 10.1.10.1 255.255.255.0
 ip helper-address 10.1.1.1
 ip helper-address 10.1.1.2
 ip helper-address 10.9.9.9
!
interface Vlan20
 ip address 10.1.20.1 255.255.255.0
 ip helper-address 10.1.1.1
 ip helper-address 10.1.1.3
!
interface Loopback0
 ip address 10.255.0.1 255.255.255.255
!
";

const SCAN_IOS: &[&str] = &["scan", "--key", "Site-001", "--platform", "ios"];

fn run(args: &[&str], config: &PathBuf, policy: &PathBuf) -> std::process::Output {
    let exe = env!("CARGO_BIN_EXE_relay-enforce");
    Command::new(exe)
        .args(args)
        .arg("--config")
        .arg(config)
        .arg("--policy")
        .arg(policy)
        .output()
        .expect("run binary")
}

#[test]
fn test_cli_scan_reports_changes() {
    let config = write_temp_file("scan_cfg", IOS_CONFIG);
    let policy = write_temp_file("scan_policy", POLICY);

    let output = run(SCAN_IOS, &config, &policy);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Interfaces scanned: 3"));
    assert!(stdout.contains("Interfaces with relays: 2"));
    assert!(stdout.contains("Plans generated: 2 (1 already compliant)"));
    assert!(stdout.contains("REMOVE: 10.1.1.2"));
    assert!(stdout.contains("ADD: 10.1.1.3"));
    assert!(!stdout.contains("REMOVE: 10.9.9.9"));
}

#[test]
fn test_cli_scan_json_output() {
    let config = write_temp_file("scan_json_cfg", IOS_CONFIG);
    let policy = write_temp_file("scan_json_policy", POLICY);

    let args = [SCAN_IOS, &["--format", "json"][..]].concat();
    let output = run(&args, &config, &policy);

    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid json report");
    assert_eq!(report["mode"], "dry-run");
    assert_eq!(report["stats"]["relays_to_remove"], 1);
    assert_eq!(report["plans"][0]["interface"], "Vlan10");
    assert_eq!(
        report["plans"][0]["commands"][0],
        "no ip helper-address 10.1.1.2"
    );
}

#[test]
fn test_cli_scan_missing_input() {
    let config = temp_path("missing_input");
    let policy = write_temp_file("missing_input_policy", POLICY);

    let output = run(SCAN_IOS, &config, &policy);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to open input file"));
}

#[test]
fn test_cli_scan_unknown_key_is_reported_not_fatal() {
    let config = write_temp_file("unknown_key_cfg", IOS_CONFIG);
    let policy = write_temp_file("unknown_key_policy", POLICY);

    let args = ["scan", "--key", "Site-404", "--platform", "ios"];
    let output = run(&args, &config, &policy);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Interfaces skipped: 2"));
    assert!(stdout.contains("does not exist in the relay policy list"));
}

#[test]
fn test_cli_verify_exit_code_indicates_changes() {
    let config = write_temp_file("verify_cfg", IOS_CONFIG);
    let policy = write_temp_file("verify_policy", POLICY);

    let args = ["verify", "--key", "Site-001", "--platform", "ios"];
    let output = run(&args, &config, &policy);

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("- ip helper-address 10.1.1.2"));
    assert!(stdout.contains("+ ip helper-address 10.1.1.3"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("verify: changes detected"));

    let args = [&args[..], &["--interface", "Vlan20"][..]].concat();
    let output = run(&args, &config, &policy);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No changes."));
}

#[test]
fn test_cli_scan_logs_malformed_relay_line() {
    let config = write_temp_file(
        "malformed_cfg",
        "interface Vlan30\n ip helper-address 10.1.1.300\n ip helper-address 10.1.1.1\n",
    );
    let policy = write_temp_file("malformed_policy", POLICY);

    let output = run(SCAN_IOS, &config, &policy);

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("WARN"));
    assert!(stderr.contains("invalid relay address \"10.1.1.300\""));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Anomalies: 1"));
    assert!(stdout.contains("Warning: Vlan30: Unrecognized relay line: line 2"));
    assert!(stdout.contains("ADD: 10.1.1.3"));
}

#[test]
fn test_cli_apply_rejects_same_input_output() {
    let config = write_temp_file("same_io", IOS_CONFIG);
    let policy = write_temp_file("same_io_policy", POLICY);

    let exe = env!("CARGO_BIN_EXE_relay-enforce");
    let output = Command::new(exe)
        .args(["apply", "--key", "Site-001", "--platform", "ios"])
        .arg("--config")
        .arg(&config)
        .arg("--policy")
        .arg(&policy)
        .arg("--out")
        .arg(&config)
        .output()
        .expect("run binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Output path must be different from input path"));
}

#[test]
fn test_cli_apply_requires_force_for_existing_output() {
    let config = write_temp_file("existing_out_cfg", IOS_CONFIG);
    let policy = write_temp_file("existing_out_policy", POLICY);
    let out = write_temp_file("existing_out_out", "! old script\n");

    let exe = env!("CARGO_BIN_EXE_relay-enforce");
    let output = Command::new(exe)
        .args(["apply", "--key", "Site-001", "--platform", "ios"])
        .arg("--config")
        .arg(&config)
        .arg("--policy")
        .arg(&policy)
        .arg("--out")
        .arg(&out)
        .output()
        .expect("run binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Output file already exists"));
    assert_eq!(fs::read_to_string(&out).unwrap(), "! old script\n");
}

#[test]
fn test_cli_apply_writes_session_script() {
    let config = write_temp_file("apply_cfg", IOS_CONFIG);
    let policy = write_temp_file("apply_policy", POLICY);
    let out = temp_path("apply_out");

    let exe = env!("CARGO_BIN_EXE_relay-enforce");
    let output = Command::new(exe)
        .args(["apply", "--key", "Site-001", "--sys-descr"])
        .arg("Cisco IOS Software, C3750E Software (C3750E-UNIVERSALK9-M), Version 15.2(4)E10")
        .arg("--config")
        .arg(&config)
        .arg("--policy")
        .arg(&policy)
        .arg("--out")
        .arg(&out)
        .output()
        .expect("run binary");

    assert!(output.status.success());
    let script = fs::read_to_string(&out).expect("script written");
    assert!(script.contains(
        "configure terminal\ninterface Vlan10\n no ip helper-address 10.1.1.2\n ip helper-address 10.1.1.3\nexit\nend\ncopy running-config startup-config\n"
    ));
    assert!(!script.contains("interface Vlan20"));
    assert!(!script.contains("10.9.9.9"));

    let mut lines = script.lines();
    let run_id = lines
        .next()
        .and_then(|line| line.strip_prefix("! relay-enforce run "))
        .expect("run id header");
    assert!(uuid::Uuid::parse_str(run_id).is_ok(), "{run_id}");
    let device = lines.next().expect("device header");
    assert!(device.starts_with("! device relay_enforce_apply_cfg_"));
    assert!(device.ends_with(" (ios) policy key Site-001"));
}

#[test]
fn test_cli_requires_platform() {
    let config = write_temp_file("no_platform_cfg", IOS_CONFIG);
    let policy = write_temp_file("no_platform_policy", POLICY);

    let output = run(&["scan", "--key", "Site-001"], &config, &policy);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Either --platform or --sys-descr must be supplied"));
}
