//! End-to-end tests that drive the `centerbooks` binary against a throwaway
//! config and data directory.

#![allow(deprecated)] // Command::cargo_bin

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

struct Env {
    root: TempDir,
}

impl Env {
    fn new() -> Self {
        let env = Env {
            root: tempfile::tempdir().unwrap(),
        };
        env.cmd()
            .args(["init", "--data-dir"])
            .arg(env.data_dir())
            .args(["--default-year", "2025"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Initialized centerbooks"));
        env
    }

    fn data_dir(&self) -> PathBuf {
        self.root.path().join("data")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("centerbooks").unwrap();
        cmd.env("CENTERBOOKS_CONFIG_DIR", self.root.path().join("config"))
            .env("RUST_LOG", "off")
            .env("NO_COLOR", "1");
        cmd
    }
}

fn write_workbook(path: &Path) {
    let mut wb = Workbook::new();

    let income = wb.add_worksheet();
    income.set_name("Doanh thu").unwrap();
    for (c, h) in ["Tháng", "Trung tâm", "Chương trình", "Số lớp", "Số học viên", "Doanh thu"]
        .iter()
        .enumerate()
    {
        income.write_string(0, c as u16, *h).unwrap();
    }
    income.write_number(1, 0, 45658.0).unwrap();
    income.write_string(1, 1, "Hanoi Center").unwrap();
    income.write_string(1, 2, "IELTS Prep").unwrap();
    income.write_number(1, 3, 3.0).unwrap();
    income.write_number(1, 4, 40.0).unwrap();
    income.write_number(1, 5, 50_000_000.0).unwrap();
    // classes < 0 is rejected by the store
    income.write_number(2, 0, 2.0).unwrap();
    income.write_string(2, 1, "Hanoi Center").unwrap();
    income.write_string(2, 2, "IELTS Prep").unwrap();
    income.write_number(2, 3, -2.0).unwrap();

    let expense = wb.add_worksheet();
    expense.set_name("Chi phí").unwrap();
    for (c, h) in ["Tháng", "Trung tâm", "Khoản chi", "Hạng mục", "Thành tiền", "Phụ cấp đi lại"]
        .iter()
        .enumerate()
    {
        expense.write_string(0, c as u16, *h).unwrap();
    }
    expense.write_number(1, 0, 1.0).unwrap();
    expense.write_string(1, 1, "Hanoi Center").unwrap();
    expense.write_string(1, 2, "Mặt bằng").unwrap();
    expense.write_string(1, 3, "Thuê nhà").unwrap();
    expense.write_number(1, 4, 10_000_000.0).unwrap();
    expense.write_number(1, 5, 500_000.0).unwrap();

    wb.save(path).unwrap();
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("centerbooks")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("report"));
}

#[test]
fn test_import_json_result() {
    let env = Env::new();
    let file = env.root.path().join("books.xlsx");
    write_workbook(&file);

    let output = env
        .cmd()
        .arg("import")
        .arg(&file)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["incomeImported"], 1);
    assert_eq!(json["expenseImported"], 1);
    let errors = json["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].as_str().unwrap().starts_with("Doanh thu row 2"));
}

#[test]
fn test_import_then_report() {
    let env = Env::new();
    let file = env.root.path().join("books.xlsx");
    write_workbook(&file);

    env.cmd()
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 rows failed"));

    env.cmd()
        .arg("centers")
        .assert()
        .success()
        .stdout(predicate::str::contains("Hanoi Center"));

    env.cmd()
        .args(["report", "pnl", "--year", "2025"])
        .assert()
        .success()
        .stdout(predicate::str::contains("50,000,000"))
        .stdout(predicate::str::contains("10,500,000"))
        .stdout(predicate::str::contains("39,500,000"));

    env.cmd()
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("books.xlsx"));
}

#[test]
fn test_corrupt_file_fails() {
    let env = Env::new();
    let file = env.root.path().join("broken.xlsx");
    std::fs::write(&file, b"not a workbook").unwrap();

    env.cmd()
        .arg("import")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_export_writes_file() {
    let env = Env::new();
    let out = env.root.path().join("export.xlsx");
    env.cmd()
        .arg("export")
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 0 income and 0 expense rows"));
    assert!(out.exists());
}

#[test]
fn test_unknown_center_report_fails() {
    let env = Env::new();
    env.cmd()
        .args(["report", "pnl", "--center", "Nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown center: Nowhere"));
}
