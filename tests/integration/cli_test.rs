use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const SHA256_1: &str = "6b86b273ff34fce19d6b804eff5a3f5747ada4eaa22f1d49c01e52ddb7875b4b";
const SHA256_2: &str = "d4735e3a265e16eee03f59718b9b5d03019c07d8b6c51f90da3a666eec13ab35";
const SHA256_42: &str = "73475cb40a568e8da8a045ced110137e159f890ac4da883b6b17dc651b3a8049";
const BOGUS: &str = "deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef";

fn get_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_idfind"))
}

/// Run the binary inside `dir` so no stray config file is picked up.
fn run_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(get_binary_path())
        .current_dir(dir)
        .env_remove("IDFIND_MAX_ID")
        .env_remove("IDFIND_WORKERS")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute idfind")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "Command failed with status: {:?}\nstderr: {}\nstdout: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout)
    );
}

#[test]
fn test_hash_command() {
    let dir = TempDir::new().unwrap();
    let output = run_in(dir.path(), &["hash", "1", "42"]);
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec![format!("1\t{}", SHA256_1), format!("42\t{}", SHA256_42)]);
}

#[test]
fn test_search_plain_list_to_csv() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("hashes.txt"),
        format!("{}\n{}\n{}\n{}\n", SHA256_2, BOGUS, SHA256_1, SHA256_2),
    )
    .unwrap();

    let output = run_in(
        dir.path(),
        &["search", "hashes.txt", "--max-id", "5", "-j", "3", "-o", "out.csv"],
    );
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Matched 3 of 4 hashes"), "stdout: {}", stdout);
    assert!(stdout.contains("Results written to"), "stdout: {}", stdout);

    let csv = fs::read_to_string(dir.path().join("out.csv")).unwrap();
    assert_eq!(
        csv,
        format!(
            "Trader Hash,Trader ID\n{},2\n{},\n{},1\n{},2\n",
            SHA256_2, BOGUS, SHA256_1, SHA256_2
        )
    );
}

#[test]
fn test_search_column_to_json() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("traders.csv"),
        format!("Region,Trader Hash\neu,{}\nus,{}\n", SHA256_42, SHA256_1),
    )
    .unwrap();

    let output = run_in(
        dir.path(),
        &[
            "search",
            "traders.csv",
            "--column",
            "Trader Hash",
            "--max-id",
            "10",
            "--format",
            "json",
            "-o",
            "out.json",
        ],
    );
    assert_success(&output);

    let json = fs::read_to_string(dir.path().join("out.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        value,
        serde_json::json!([
            { "hash": SHA256_42, "id": null },
            { "hash": SHA256_1, "id": 1 },
        ])
    );
}

#[test]
fn test_search_uses_config_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("hashes.txt"), format!("{}\n", SHA256_42)).unwrap();
    fs::write(
        dir.path().join("idfind.toml"),
        "[search]\nmax_id = 100\nworkers = 2\n\n[output]\npath = \"found.csv\"\nid_header = \"Id\"\n",
    )
    .unwrap();

    let output = run_in(dir.path(), &["search", "hashes.txt"]);
    assert_success(&output);

    let csv = fs::read_to_string(dir.path().join("found.csv")).unwrap();
    assert_eq!(csv, format!("Trader Hash,Id\n{},42\n", SHA256_42));
}

#[test]
fn test_search_non_positive_max_id_matches_nothing() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("hashes.txt"), format!("{}\n", SHA256_1)).unwrap();

    let output = run_in(dir.path(), &["search", "hashes.txt", "--max-id", "-3", "-o", "out.csv"]);
    assert_success(&output);

    let csv = fs::read_to_string(dir.path().join("out.csv")).unwrap();
    assert_eq!(csv, format!("Trader Hash,Trader ID\n{},\n", SHA256_1));
}

#[test]
fn test_cli_override_fixes_invalid_config_value() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("traders.csv"),
        format!("Name,Trader Hash\n\"Doe, John\",{}\n", SHA256_42),
    )
    .unwrap();
    fs::write(
        dir.path().join("idfind.toml"),
        "[search]\nmax_id = 50\n\n[input]\ncolumn = \"Trader Hash\"\ndelimiter = \";;\"\n",
    )
    .unwrap();

    // The config file alone is rejected
    let output = run_in(dir.path(), &["search", "traders.csv"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("input.delimiter"), "stderr: {}", stderr);

    let output = run_in(dir.path(), &["search", "traders.csv", "--delimiter", ","]);
    assert_success(&output);

    let csv = fs::read_to_string(dir.path().join("trader_id_results.csv")).unwrap();
    assert_eq!(csv, format!("Trader Hash,Trader ID\n{},42\n", SHA256_42));
}

#[test]
fn test_search_missing_column_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("traders.csv"), "a,b\n1,2\n").unwrap();

    let output = run_in(dir.path(), &["search", "traders.csv", "--column", "Trader Hash"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Column 'Trader Hash' not found"), "stderr: {}", stderr);
    assert!(!dir.path().join("trader_id_results.csv").exists());
}

#[test]
fn test_search_missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("hashes.txt"), format!("{}\n", SHA256_1)).unwrap();

    let output = run_in(dir.path(), &["search", "hashes.txt", "--config", "nope.toml"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nope.toml"), "stderr: {}", stderr);
}

#[test]
fn test_init_config() {
    let dir = TempDir::new().unwrap();

    let output = run_in(dir.path(), &["init-config"]);
    assert_success(&output);
    let content = fs::read_to_string(dir.path().join("idfind.toml")).unwrap();
    assert!(content.contains("max_id = 5_000_000"));

    // Refuses to overwrite without --force
    let output = run_in(dir.path(), &["init-config"]);
    assert!(!output.status.success());

    let output = run_in(dir.path(), &["init-config", "--force"]);
    assert_success(&output);
}
