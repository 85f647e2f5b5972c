use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_cli(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_modsnap_cli"))
        .args(args)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("APPDATA", home)
        .env("LOCALAPPDATA", home)
        .env("HOME", home)
        .output()
        .expect("failed to run modsnap_cli")
}

fn stdout_of(output: Output) -> String {
    assert!(
        output.status.success(),
        "command failed: {}\n{}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout not utf-8")
}

fn write_snapshot(path: &Path, files: &[&str]) {
    let mods: Vec<Value> = files
        .iter()
        .map(|f| serde_json::json!({ "file_name": f, "modified_at": "2024-01-01T00:00:00Z" }))
        .collect();
    let snapshot = serde_json::json!({
        "profiles": [{ "profile_path": "/profiles/Main", "mods": mods }]
    });
    fs::write(path, serde_json::to_string_pretty(&snapshot).unwrap()).unwrap();
}

#[test]
fn classify_json_output() {
    let home = TempDir::new().expect("home dir");
    let stdout = stdout_of(run_cli(
        home.path(),
        &["classify", "examplemod-2.0.1+1.20.1-fabric.jar", "mymod.jar", "--json"],
    ));
    let rows: Value = serde_json::from_str(&stdout).expect("invalid json output");
    let rows = rows.as_array().expect("array output");
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0]["name"], "examplemod");
    assert_eq!(rows[0]["version"], "2.0.1");
    assert_eq!(rows[0]["platform_version"], "1.20.1");
    assert_eq!(rows[0]["loader"], "fabric");

    assert_eq!(rows[1]["name"], "mymod");
    assert!(rows[1]["version"].is_null());
    assert_eq!(rows[1]["platform_version"], "unknown");
    assert_eq!(rows[1]["loader"], "unknown");
}

#[test]
fn classify_with_known_versions_file() {
    let home = TempDir::new().expect("home dir");
    let versions = home.path().join("versions.txt");
    fs::write(&versions, "# catalog\n1.19.2\n1.20.1\n").unwrap();

    let stdout = stdout_of(run_cli(
        home.path(),
        &[
            "classify",
            "jei-1.20.1-forge-15.2.0.27.jar",
            "--known-versions",
            versions.to_str().unwrap(),
            "--json",
        ],
    ));
    let rows: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(rows[0]["platform_version"], "1.20.1");
    assert_eq!(rows[0]["valid_platform_version"], true);
    assert_eq!(rows[0]["loader"], "forge");
}

#[test]
fn diff_command_renders_report() {
    let home = TempDir::new().expect("home dir");
    let previous = home.path().join("previous.json");
    let current = home.path().join("current.json");
    write_snapshot(&previous, &["a.jar"]);
    write_snapshot(&current, &["a.jar", "b.jar"]);

    let stdout = stdout_of(run_cli(
        home.path(),
        &["diff", previous.to_str().unwrap(), current.to_str().unwrap()],
    ));
    assert!(stdout.starts_with("ModSnap Diff Report"));
    assert!(stdout.contains("Summary: 1 profile(s) with additions"));
    assert!(stdout.contains("Profile: Main\n  Added (1):\n    - b.jar"));
}

#[test]
fn diff_with_missing_previous_is_first_snapshot() {
    let home = TempDir::new().expect("home dir");
    let current = home.path().join("current.json");
    write_snapshot(&current, &["a.jar"]);

    let stdout = stdout_of(run_cli(
        home.path(),
        &["diff", home.path().join("nope.json").to_str().unwrap(), current.to_str().unwrap()],
    ));
    assert!(stdout.starts_with("ModSnap First Snapshot"));
}

#[test]
fn diff_with_missing_current_fails() {
    let home = TempDir::new().expect("home dir");
    let previous = home.path().join("previous.json");
    write_snapshot(&previous, &["a.jar"]);

    let output = run_cli(
        home.path(),
        &["diff", previous.to_str().unwrap(), home.path().join("nope.json").to_str().unwrap()],
    );
    assert!(!output.status.success());
}

#[test]
fn init_config_writes_default_file() {
    let home = TempDir::new().expect("home dir");
    let config = home.path().join("custom").join("modsnap.toml");

    let stdout = stdout_of(run_cli(
        home.path(),
        &["--config", config.to_str().unwrap(), "init-config"],
    ));
    assert_eq!(stdout.trim(), config.to_str().unwrap());

    let text = fs::read_to_string(&config).expect("config not written");
    assert!(text.contains("mods_dir_name = \"mods\""));
    assert!(text.contains("[classifier]"));

    // Second run leaves an edited file alone
    fs::write(&config, "mods_dir_name = \"addons\"\n").unwrap();
    stdout_of(run_cli(
        home.path(),
        &["--config", config.to_str().unwrap(), "init-config"],
    ));
    assert_eq!(fs::read_to_string(&config).unwrap(), "mods_dir_name = \"addons\"\n");
}
