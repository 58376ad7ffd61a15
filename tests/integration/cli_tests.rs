//! Integration tests for the adif-persona CLI.
//!
//! These are registered as a [[test]] in the adif-persona-cli crate so that
//! the `CARGO_BIN_EXE_adif-persona` environment variable is available.
//!
//! Every invocation runs inside a fresh temp directory carrying a project
//! marker, so the tests never touch the per-user registry, and with the
//! keyring backend disabled so they never touch the platform keyring.

use std::process::{Command, Output};

use tempfile::TempDir;

/// Fresh registry directory: the marker points the index at a local file.
fn registry_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    std::fs::write(
        dir.path().join("adif-persona.json"),
        r#"{"personas_index": "personas.json"}"#,
    )
    .expect("write project marker");
    dir
}

fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_adif-persona"));
    cmd.current_dir(dir.path());
    cmd.env("ADIF_PERSONA_KEYRING", "disabled");
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("failed to execute adif-persona binary")
}

#[test]
fn cli_responds_to_help() {
    let dir = registry_dir();
    let output = run(cli(&dir).arg("--help"));

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Persona and provider-credential registry"));
    assert!(stdout.contains("set-credential"));
}

#[test]
fn cli_add_then_list_round_trip() {
    let dir = registry_dir();

    let output = run(cli(&dir).args([
        "add",
        "--name",
        "Primary",
        "--callsign",
        "ki7mt",
        "--start",
        "2024-01-01",
    ]));
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Saved persona: Primary"));
    assert!(stdout.contains("KI7MT"), "callsign must be uppercased");

    let output = run(cli(&dir).arg("list"));
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("- Primary: KI7MT"));

    // The index landed next to the marker, not in the user config dir.
    assert!(dir.path().join("personas.json").is_file());
}

#[test]
fn cli_add_rejects_malformed_date_with_one_line_error() {
    let dir = registry_dir();

    let output = run(cli(&dir).args([
        "add",
        "--name",
        "P",
        "--callsign",
        "K1P",
        "--start",
        "not-a-date",
    ]));
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: "));
    assert_eq!(stderr.trim_end().lines().count(), 1);

    // Nothing was written.
    assert!(!dir.path().join("personas.json").exists());
}

#[test]
fn cli_add_rejects_inverted_span() {
    let dir = registry_dir();

    let output = run(cli(&dir).args([
        "add",
        "--name",
        "P",
        "--callsign",
        "K1P",
        "--start",
        "2025-06-01",
        "--end",
        "2025-01-01",
    ]));
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: "));
}

#[test]
fn cli_remove_unknown_persona_fails() {
    let dir = registry_dir();

    let output = run(cli(&dir).args(["remove", "Nobody"]));
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No such persona: Nobody"));
}

#[test]
fn cli_set_credential_warns_without_keyring_but_keeps_the_ref() {
    let dir = registry_dir();
    run(cli(&dir).args(["add", "--name", "Primary", "--callsign", "KI7MT"]));

    let output = run(cli(&dir).args([
        "set-credential",
        "--persona",
        "Primary",
        "--provider",
        "lotw",
        "--username",
        "ki7mt",
        "--password",
        "hunter2",
    ]));

    // A dead secret backend degrades to a warning, never an error exit.
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("Credential ref saved for Primary/lotw"));
    assert!(stderr.contains("NOT stored"));

    // The ref is in the registry; the password never is.
    let raw = std::fs::read_to_string(dir.path().join("personas.json")).unwrap();
    assert!(raw.contains("ki7mt"));
    assert!(!raw.contains("hunter2"));
}

#[test]
fn cli_set_credential_unknown_persona_fails() {
    let dir = registry_dir();

    let output = run(cli(&dir).args([
        "set-credential",
        "--persona",
        "Nobody",
        "--provider",
        "eqsl",
        "--username",
        "user",
        "--password",
        "pw",
    ]));
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No such persona: Nobody"));
}

#[test]
fn cli_show_shared_callsign_lists_candidates_and_fails() {
    let dir = registry_dir();
    run(cli(&dir).args(["add", "--name", "Contest", "--callsign", "W7A"]));
    run(cli(&dir).args(["add", "--name", "Legacy", "--callsign", "w7a"]));

    let output = run(cli(&dir).args(["show", "W7A"]));
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Multiple personas use callsign W7A"));
    assert!(stdout.contains("- Contest: W7A"));
    assert!(stdout.contains("- Legacy: W7A"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--name"));

    // Disambiguated by exact name.
    let output = run(cli(&dir).args(["show", "--name", "Contest"]));
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("- Contest: W7A"));
}

#[test]
fn cli_show_by_name_does_not_see_callsigns() {
    let dir = registry_dir();
    run(cli(&dir).args(["add", "--name", "Primary", "--callsign", "KI7MT"]));

    let output = run(cli(&dir).args(["show", "KI7MT", "--by", "name"]));
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No persona found for 'KI7MT'"));
}

#[test]
fn cli_credentials_reports_secret_absent_without_keyring() {
    let dir = registry_dir();
    run(cli(&dir).args(["add", "--name", "Primary", "--callsign", "KI7MT"]));
    run(cli(&dir).args([
        "set-credential",
        "--persona",
        "Primary",
        "--provider",
        "qrz",
        "--username",
        "ki7mt",
        "--password",
        "pw",
    ]));

    let output = run(cli(&dir).args(["credentials", "Primary"]));
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("- qrz: username=ki7mt"));
    assert!(stdout.contains("secret: absent"));
}
