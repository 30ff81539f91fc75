use std::fs;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::tempdir;

fn write_sample_csv(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("Orders.csv");
    fs::write(&path, "id,customer,amount\n1,Ann,42.5\n2,O'Brien,13\n").expect("write sample csv");
    path
}

#[test]
fn generate_prints_script_to_stdout() {
    let dir = tempdir().expect("temp dir");
    let csv_path = write_sample_csv(dir.path());
    Command::cargo_bin("tabular_sql")
        .expect("binary exists")
        .args(["generate", "-i", csv_path.to_str().unwrap(), "--stdout"])
        .assert()
        .success()
        .stdout(contains("CREATE TABLE IF NOT EXISTS orders ("))
        .stdout(contains("VALUES (2, 'O''Brien', 13.0);"));
}

#[test]
fn generate_writes_numbered_files() {
    let dir = tempdir().expect("temp dir");
    let csv_path = write_sample_csv(dir.path());
    let out = dir.path().join("scripts");
    for _ in 0..2 {
        Command::cargo_bin("tabular_sql")
            .expect("binary exists")
            .args([
                "generate",
                "-i",
                csv_path.to_str().unwrap(),
                "-o",
                out.to_str().unwrap(),
            ])
            .assert()
            .success();
    }
    assert!(out.join("orders.sql").is_file());
    assert!(out.join("orders_1.sql").is_file());
}

#[test]
fn generate_rejects_unsupported_file() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("notes.md");
    fs::write(&path, "# notes").expect("write notes");
    Command::cargo_bin("tabular_sql")
        .expect("binary exists")
        .args(["generate", "-i", path.to_str().unwrap(), "--stdout"])
        .assert()
        .failure()
        .stderr(contains("Unsupported file format"));
}

#[test]
fn batch_skips_unsupported_files() {
    let dir = tempdir().expect("temp dir");
    let input = dir.path().join("in");
    fs::create_dir(&input).expect("create input dir");
    write_sample_csv(&input);
    fs::write(input.join("codes.txt"), "100Springfield  5\n200Shelbyville 7\n").expect("write txt");
    fs::write(input.join("readme.md"), "ignored").expect("write readme");
    let out = dir.path().join("out");

    Command::cargo_bin("tabular_sql")
        .expect("binary exists")
        .args([
            "batch",
            "-d",
            input.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert!(out.join("orders.sql").is_file());
    assert!(out.join("codes.sql").is_file());
    assert!(!out.join("readme.sql").exists());
}

#[test]
fn generate_splits_leading_codes() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("towns.txt");
    fs::write(&path, "100Springfield  5\n200Shelbyville 7\n").expect("write txt");
    Command::cargo_bin("tabular_sql")
        .expect("binary exists")
        .args(["generate", "-i", path.to_str().unwrap(), "--stdout", "--split-code"])
        .assert()
        .success()
        .stdout(contains("\"0\" INTEGER"))
        .stdout(contains("VALUES (100, 'Springfield', 5);"));
}

#[test]
fn run_then_read_round_trip() {
    let dir = tempdir().expect("temp dir");
    let csv_path = write_sample_csv(dir.path());
    let out = dir.path().join("scripts");
    let db = dir.path().join("etl.db");

    Command::cargo_bin("tabular_sql")
        .expect("binary exists")
        .args([
            "generate",
            "-i",
            csv_path.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    Command::cargo_bin("tabular_sql")
        .expect("binary exists")
        .args([
            "run",
            "--db",
            db.to_str().unwrap(),
            out.join("orders.sql").to_str().unwrap(),
        ])
        .assert()
        .success();

    Command::cargo_bin("tabular_sql")
        .expect("binary exists")
        .args(["read", "--db", db.to_str().unwrap(), "orders"])
        .assert()
        .success()
        .stdout(contains("id\tcustomer\tamount"))
        .stdout(contains("2\tO'Brien\t13"));

    Command::cargo_bin("tabular_sql")
        .expect("binary exists")
        .args(["read", "--db", db.to_str().unwrap(), "orders", "--json"])
        .assert()
        .success()
        .stdout(contains("\"O'Brien\""));
}
