use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn mdwrap() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mdwrap"));
    cmd.env_remove("RUST_LOG").arg("--color").arg("never");
    cmd
}

const LONG_LINE: &str = "This is a very long line of text that needs wrapping\n";

#[test]
fn test_wrap_rewrites_file_in_place() {
    let temp_dir = tempdir().unwrap();
    let file = temp_dir.path().join("doc.md");
    fs::write(&file, LONG_LINE).unwrap();

    mdwrap()
        .current_dir(temp_dir.path())
        .args(["--no-config", "wrap", "--wrap-column", "20", "doc.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrapped 1 line(s)"));

    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "This is a very long\nline of text that\nneeds wrapping\n"
    );
}

#[test]
fn test_diff_does_not_write() {
    let temp_dir = tempdir().unwrap();
    let file = temp_dir.path().join("doc.md");
    fs::write(&file, LONG_LINE).unwrap();

    mdwrap()
        .current_dir(temp_dir.path())
        .args(["--no-config", "wrap", "--diff", "--wrap-column", "20", "doc.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-This is a very long line").and(predicate::str::contains("+needs wrapping")));

    assert_eq!(fs::read_to_string(&file).unwrap(), LONG_LINE);
}

#[test]
fn test_check_exits_one_when_lines_would_wrap() {
    let temp_dir = tempdir().unwrap();
    fs::write(temp_dir.path().join("doc.md"), LONG_LINE).unwrap();

    mdwrap()
        .current_dir(temp_dir.path())
        .args(["--no-config", "check", "--wrap-column", "20", "doc.md"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("doc.md:1:"));
}

#[test]
fn test_check_passes_when_everything_fits() {
    let temp_dir = tempdir().unwrap();
    fs::write(temp_dir.path().join("doc.md"), LONG_LINE).unwrap();

    mdwrap()
        .current_dir(temp_dir.path())
        .args(["--no-config", "check", "--wrap-column", "80", "."])
        .assert()
        .success();
}

#[test]
fn test_stdin_round_trip() {
    mdwrap()
        .args(["--no-config", "wrap", "--wrap-column", "15", "-"])
        .write_stdin("- word1 word2 word3 word4\r\n")
        .assert()
        .success()
        .stdout("- word1 word2\r\n  word3 word4\r\n");
}

#[test]
fn test_lines_option_limits_range() {
    let temp_dir = tempdir().unwrap();
    let file = temp_dir.path().join("doc.md");
    let content = "one two three\none two three\none two three\n";
    fs::write(&file, content).unwrap();

    mdwrap()
        .current_dir(temp_dir.path())
        .args(["--no-config", "wrap", "--wrap-column", "8", "--lines", "2:2", "doc.md"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "one two three\none two\nthree\none two three\n"
    );
}

#[test]
fn test_missing_wrap_column_is_tool_error() {
    let temp_dir = tempdir().unwrap();
    fs::write(temp_dir.path().join("doc.md"), LONG_LINE).unwrap();

    mdwrap()
        .current_dir(temp_dir.path())
        .args(["--no-config", "wrap", "doc.md"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No wrap column is configured"));
}

#[test]
fn test_project_config_is_discovered() {
    let temp_dir = tempdir().unwrap();
    fs::create_dir(temp_dir.path().join(".git")).unwrap();
    fs::write(temp_dir.path().join(".mdwrap.toml"), "[global]\nrulers = [20]\n").unwrap();
    fs::write(temp_dir.path().join("doc.md"), LONG_LINE).unwrap();

    mdwrap()
        .current_dir(temp_dir.path())
        .args(["check", "doc.md"])
        .assert()
        .code(1);
}

#[test]
fn test_excluded_file_is_skipped() {
    let temp_dir = tempdir().unwrap();
    fs::create_dir(temp_dir.path().join(".git")).unwrap();
    fs::write(
        temp_dir.path().join(".mdwrap.toml"),
        "[global]\nrulers = [20]\nexclude = [\"CHANGELOG.md\"]\n",
    )
    .unwrap();
    fs::write(temp_dir.path().join("CHANGELOG.md"), LONG_LINE).unwrap();

    mdwrap()
        .current_dir(temp_dir.path())
        .args(["check", "."])
        .assert()
        .success();
}

#[test]
fn test_init_then_config() {
    let temp_dir = tempdir().unwrap();

    mdwrap()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created default configuration file"));
    assert!(temp_dir.path().join(".mdwrap.toml").exists());

    mdwrap()
        .current_dir(temp_dir.path())
        .args(["init"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already exists"));

    mdwrap()
        .current_dir(temp_dir.path())
        .args(["--config", ".mdwrap.toml", "config", "get", "global.rulers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("global.rulers = [80]"));

    mdwrap()
        .current_dir(temp_dir.path())
        .args(["--config", ".mdwrap.toml", "config", "--output", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"rulers\": [\n      80\n    ]"));
}

#[test]
fn test_version() {
    mdwrap()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("mdwrap "));
}
