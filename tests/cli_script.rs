use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn cli(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("zenith_cli").unwrap();
    cmd.env("ZENITH_CLI_SCRIPT", "1")
        .env("ZENITH_HOME", home)
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn script_mode_records_and_summarizes() {
    let home = tempfile::tempdir().unwrap();
    let script = "add 12.34 food lunch\n\
                  add 12.34 food lunch\n\
                  add 30 transport \"monthly pass\" --vendor Metro\n\
                  summary\n\
                  recurring\n\
                  exit\n";

    cli(home.path())
        .write_stdin(script)
        .assert()
        .success()
        .stdout(contains("Added #1: lunch [Food] $12.34"))
        .stdout(contains("Added #3: monthly pass [Transport] $30.00"))
        .stdout(contains("Total   : $54.68"))
        .stdout(contains("lunch").and(contains("$24.68")));

    assert!(home.path().join("data").join("zenith-txns.json").exists());
}

#[test]
fn ledger_survives_restart() {
    let home = tempfile::tempdir().unwrap();
    cli(home.path())
        .write_stdin("add 5 food bagel\nexit\n")
        .assert()
        .success();

    cli(home.path())
        .write_stdin("add 7 food soup\nlist\n")
        .assert()
        .success()
        .stdout(contains("Added #2: soup"))
        .stdout(contains("bagel"));
}

#[test]
fn ask_without_model_reports_it() {
    let home = tempfile::tempdir().unwrap();
    cli(home.path())
        .write_stdin("add 5 food bagel\nask how much did I spend?\n")
        .assert()
        .success()
        .stdout(contains("Model not loaded! Please download the LLM model first."));
}

#[test]
fn questions_with_apostrophes_reach_the_coach() {
    let home = tempfile::tempdir().unwrap();
    cli(home.path())
        .write_stdin("add 5 food bagel\nask what's my average? I've been careful\n")
        .assert()
        .success()
        .stdout(contains("Model not loaded! Please download the LLM model first."))
        .stdout(contains("missing closing quote").not())
        .stderr(contains("missing closing quote").not());
}

#[test]
fn bad_input_is_reported_and_loop_continues() {
    let home = tempfile::tempdir().unwrap();
    cli(home.path())
        .write_stdin("add abc food x\nadd 3 snacks chips\nsumary\nbills samples\nbills total\n")
        .assert()
        .success()
        .stdout(contains("invalid amount `abc`"))
        .stdout(contains("Unknown category `snacks`"))
        .stdout(contains("Did you mean `summary`?"))
        .stdout(contains("Added 4 sample bill(s)."))
        .stdout(contains("Monthly commitment: $67.00"));
}
