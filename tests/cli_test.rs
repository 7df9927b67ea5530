use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

const ACCOUNTS: &str = r#"[
  {"id": 1, "number": "1234567890", "balance": "100.00", "status": "ACTIVE", "version": 0},
  {"id": 2, "number": "0987654321", "balance": "10.00", "status": "ACTIVE", "version": 0}
]"#;

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let accounts_path = dir.path().join("accounts.json");
    let requests_path = dir.path().join("requests.jsonl");
    std::fs::write(&accounts_path, ACCOUNTS)?;
    std::fs::write(
        &requests_path,
        concat!(
            r#"{"sourceAccountNumber":"1234567890","kind":"DEPOSIT","amount":"50.50","description":"cash deposit"}"#,
            "\n",
            r#"{"sourceAccountNumber":"1234567890","kind":"WITHDRAWAL","amount":"999.00"}"#,
            "\n",
        ),
    )?;

    let mut cmd = Command::new(cargo_bin!("tx-executor"));
    cmd.arg(&accounts_path).arg(&requests_path);

    cmd.assert()
        .success()
        // the deposit completes, the overdraft is rejected with a reason
        .stdout(predicate::str::contains("\"state\":\"COMPLETED\""))
        .stdout(predicate::str::contains("\"state\":\"ERROR\""))
        .stdout(predicate::str::contains("insufficient funds"))
        // final balance: 100.00 + 50.50
        .stdout(predicate::str::contains("\"balance\":\"150.50\""));

    Ok(())
}

#[test]
fn test_cli_transfer_and_dead_letter() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let accounts_path = dir.path().join("accounts.json");
    let requests_path = dir.path().join("requests.jsonl");
    std::fs::write(&accounts_path, ACCOUNTS)?;
    std::fs::write(
        &requests_path,
        concat!(
            r#"{"sourceAccountNumber":"1234567890","destinationAccountNumber":"0987654321","kind":"TRANSFER","amount":"25.00"}"#,
            "\n",
            "this line is not a payload\n",
        ),
    )?;

    let mut cmd = Command::new(cargo_bin!("tx-executor"));
    cmd.arg(&accounts_path).arg(&requests_path);

    cmd.assert()
        .success()
        // both legs applied: 100.00 - 25.00 and 10.00 + 25.00
        .stdout(predicate::str::contains("\"balance\":\"75.00\""))
        .stdout(predicate::str::contains("\"balance\":\"35.00\""))
        // the garbage line never reaches the ledger
        .stdout(predicate::str::contains("\"transactionId\":2").not());

    Ok(())
}

#[test]
fn test_cli_rejects_missing_input() {
    let mut cmd = Command::new(cargo_bin!("tx-executor"));
    cmd.arg("no-such-accounts.json").arg("no-such-requests.jsonl");
    cmd.assert().failure();
}
