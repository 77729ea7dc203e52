use assert_cmd::cargo::cargo_bin_cmd;

fn help_text(args: &[&str]) -> String {
    let mut cmd = cargo_bin_cmd!("docvaultctl");
    let output = cmd
        .args(args)
        .arg("--help")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8_lossy(&output).into_owned()
}

#[test]
fn top_level_help_lists_commands() {
    let text = help_text(&[]);
    for command in ["db", "register", "login", "doc"] {
        assert!(text.contains(command), "help missing '{command}'");
    }
}

#[test]
fn db_subcommands_present() {
    let text = help_text(&["db"]);
    assert!(text.contains("migrate"), "db help missing migrate");
}

#[test]
fn doc_subcommands_present() {
    let text = help_text(&["doc"]);
    for command in ["put", "get", "delete"] {
        assert!(text.contains(command), "doc help missing '{command}'");
    }
    let put = help_text(&["doc", "put"]);
    assert!(put.contains("--content-type"), "doc put help missing --content-type");
}

#[test]
fn register_help_hides_the_password_value() {
    let mut cmd = cargo_bin_cmd!("docvaultctl");
    let output = cmd
        .env("DOCVAULT_PASSWORD", "do-not-print-me")
        .args(["register", "--help"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8_lossy(&output);
    assert!(text.contains("--role"));
    assert!(!text.contains("do-not-print-me"));
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    let mut cmd = cargo_bin_cmd!("docvaultctl");
    cmd.assert().failure();
}
