use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_malformed_csv_handling() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("robustness_test.csv");
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(&output_path)
        .unwrap();
    wtr.write_record(["from_account", "to_account", "amount", "currency"])
        .unwrap();

    // Valid transfer
    wtr.write_record(["acc-1", "acc-2", "100", "EUR"]).unwrap();
    // Missing amount and currency
    wtr.write_record(["acc-1", "acc-2"]).unwrap();
    // Empty amount
    wtr.write_record(["acc-1", "acc-2", "", "EUR"]).unwrap();
    // Valid transfer again
    wtr.write_record(["acc-3", "acc-4", "250", "GBP"]).unwrap();
    wtr.flush().unwrap();
    drop(wtr);

    let mut cmd = Command::new(cargo_bin!("tx-pipeline"));
    cmd.arg(&output_path).arg("--scoring").arg("amount");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading transaction"))
        .stdout(predicate::str::contains(",100,EUR,0,enriched;standard;routed:approval"))
        .stdout(predicate::str::contains(",250,GBP,1,enriched;standard;routed:approval"));
}

#[test]
fn test_invalid_data_types() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("data_type_test.csv");
    let mut wtr = csv::Writer::from_path(&output_path).unwrap();
    wtr.write_record(["from_account", "to_account", "amount", "currency"])
        .unwrap();

    // Text in amount field
    wtr.write_record(["acc-1", "acc-2", "not_a_number", "EUR"])
        .unwrap();
    // Valid transfer
    wtr.write_record(["acc-1", "acc-2", "5.0", "EUR"]).unwrap();
    wtr.flush().unwrap();
    drop(wtr);

    let mut cmd = Command::new(cargo_bin!("tx-pipeline"));
    cmd.arg(&output_path).arg("--scoring").arg("amount");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading transaction"))
        .stdout(predicate::str::contains(",5.0,EUR,0,enriched;standard;routed:approval"))
        .stdout(predicate::str::contains("not_a_number").not());
}

#[test]
fn test_rejected_rows_do_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("rejected.csv");
    let mut wtr = csv::Writer::from_path(&output_path).unwrap();
    wtr.write_record(["from_account", "to_account", "amount", "currency"])
        .unwrap();
    wtr.write_record(["acc-1", "acc-2", "0", "EUR"]).unwrap();
    wtr.write_record(["acc-1", "acc-2", "-10", "EUR"]).unwrap();
    wtr.write_record(["acc-1", "acc-2", "400", "EUR"]).unwrap();
    wtr.flush().unwrap();
    drop(wtr);

    let mut cmd = Command::new(cargo_bin!("tx-pipeline"));
    cmd.arg(&output_path).arg("--scoring").arg("amount");

    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let dead_lettered = stdout
        .lines()
        .filter(|line| line.starts_with("transactions-inbound/$DeadLetterQueue"))
        .count();
    assert_eq!(dead_lettered, 2);
    assert!(stdout.contains(",400,EUR,2,enriched;standard;routed:approval"));
}
