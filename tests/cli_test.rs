mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::generate_csv;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("transactions.csv");
    generate_csv(
        &input,
        &[
            ("500", "EUR"),
            ("20000", "EUR"),
            ("50000", "ETH"),
            ("2000", "BTC"),
            ("-5", "USD"),
        ],
    )?;

    let mut cmd = Command::new(cargo_bin!());
    cmd.arg(&input).arg("--scoring").arg("amount");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "queue,transaction_id,amount,currency,risk_score,tags,subject,reason,description",
        ))
        // 500 EUR scores 2 and is approved
        .stdout(predicate::str::contains(
            ",500,EUR,2,enriched;standard;routed:approval",
        ))
        .stdout(predicate::str::contains(
            ",20000,EUR,70,enriched;high-value;routed:audit",
        ))
        .stdout(predicate::str::contains("transactions-fraud"))
        .stdout(predicate::str::contains("transactions-highrisk"))
        .stdout(predicate::str::contains("HighRiskTransaction"))
        .stdout(predicate::str::contains("ValidationFailed"))
        .stdout(predicate::str::contains("Amount must be greater than zero."));

    Ok(())
}

#[test]
fn test_cli_missing_input_fails() {
    let mut cmd = Command::new(cargo_bin!());
    cmd.arg("does/not/exist.csv");

    cmd.assert().failure();
}
