use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn passbook(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("passbook").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"));
    cmd
}

#[test]
fn test_institutions_lists_builtin_keys() {
    let home = TempDir::new().unwrap();
    passbook(&home)
        .arg("institutions")
        .assert()
        .success()
        .stdout(predicate::str::contains("kvb"))
        .stdout(predicate::str::contains("karur vysya bank"))
        .stdout(predicate::str::contains("indusind"));
}

#[test]
fn test_unknown_bank_fails() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("statement.pdf");
    std::fs::write(&file, b"%PDF-1.4").unwrap();

    passbook(&home)
        .args(["extract", "--no-ocr", "--bank", "acme savings"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("acme savings"));
}

#[test]
fn test_unreadable_pdf_yields_empty_array() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("statement.pdf");
    std::fs::write(&file, b"not a pdf at all").unwrap();

    passbook(&home)
        .args(["extract", "--no-ocr", "--bank", "KVB"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[]"));
}

#[test]
fn test_missing_input_fails() {
    let home = TempDir::new().unwrap();
    passbook(&home)
        .args(["extract", "--no-ocr", "--bank", "kvb", "missing.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_image_without_ocr_fails() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("scan.png");
    std::fs::write(&file, b"png").unwrap();

    passbook(&home)
        .args(["extract", "--no-ocr", "--bank", "icici"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("OCR"));
}

#[test]
fn test_config_init_and_path() {
    let home = TempDir::new().unwrap();

    passbook(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("passbook"))
        .stdout(predicate::str::contains("not created"));

    passbook(&home)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));

    passbook(&home)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    passbook(&home)
        .args(["config", "get", "pdf.page_ocr_threshold"])
        .assert()
        .success()
        .stdout(predicate::str::contains("80"));
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let home = TempDir::new().unwrap();

    passbook(&home)
        .args(["config", "set", "pdf.max_pages", "5"])
        .assert()
        .success();

    passbook(&home)
        .args(["config", "get", "pdf.max_pages"])
        .assert()
        .success()
        .stdout(predicate::str::contains("5"));

    passbook(&home)
        .args(["config", "set", "pdf.no_such_key", "1"])
        .assert()
        .failure();
}

#[test]
fn test_config_file_flag_and_model_paths() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("passbook.json");
    let models = home.path().join("models");
    std::fs::create_dir_all(&models).unwrap();
    std::fs::write(models.join("det.onnx"), b"").unwrap();

    passbook(&home)
        .arg("--config")
        .arg(&file)
        .args(["config", "init", "--model-dir"])
        .arg(&models)
        .assert()
        .success();
    assert!(file.exists());

    passbook(&home)
        .arg("--config")
        .arg(&file)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("det.onnx (found)"))
        .stdout(predicate::str::contains("latin_rec.onnx (missing)"));

    passbook(&home)
        .arg("--config")
        .arg(&file)
        .args(["config", "set", "pdf.render_dpi", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("render_dpi"));
}

#[test]
fn test_batch_writes_summary() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("in");
    let output = home.path().join("out");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::write(input.join("april.pdf"), b"garbage").unwrap();
    std::fs::write(input.join("may.pdf"), b"garbage").unwrap();

    let pattern = format!("{}/*.pdf", input.display());
    passbook(&home)
        .args(["batch", "--no-ocr", "--bank", "canara", "--summary", "-j", "2"])
        .arg("-o")
        .arg(&output)
        .arg(&pattern)
        .assert()
        .success();

    assert!(output.join("april.json").exists());
    let summary = std::fs::read_to_string(output.join("summary.csv")).unwrap();
    assert!(summary.starts_with("filename,status,transactions"));
    assert!(summary.contains("may.pdf,success,0"));
}
