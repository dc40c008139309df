use assert_cmd::Command;

#[test]
fn help_lists_subcommands() {
    let output = Command::cargo_bin("bookstore-cli")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let help = String::from_utf8(output).unwrap();
    assert!(help.contains("migrate"));
    assert!(help.contains("config"));
}

#[test]
fn config_redacts_the_database_password() {
    let config_dir = std::env::temp_dir().join("bookstore-cli-test-empty-config");

    let output = Command::cargo_bin("bookstore-cli")
        .unwrap()
        .arg("config")
        .env("BOOKSTORE_CONFIG_DIR", &config_dir)
        .env("BOOKSTORE_ENV", "local")
        .env("BOOKSTORE_DATABASE__PASSWORD", "hunter2")
        .env("BOOKSTORE_SERVER__PORT", "9191")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let rendered: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(rendered["database"]["password"], "********");
    assert_eq!(rendered["server"]["port"], 9191);
    assert_eq!(rendered["environment"], "local");
}

#[test]
fn unknown_environment_fails() {
    Command::cargo_bin("bookstore-cli")
        .unwrap()
        .arg("config")
        .env("BOOKSTORE_ENV", "qa")
        .assert()
        .failure();
}
