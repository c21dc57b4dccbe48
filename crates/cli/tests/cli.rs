use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("shelf")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("serve"))
        .stdout(contains("migrate"));
}

#[test]
fn rejects_unknown_environment() {
    Command::cargo_bin("shelf")
        .unwrap()
        .args(["--env", "qa", "migrate"])
        .assert()
        .failure()
        .stderr(contains("unsupported environment 'qa'"));
}

#[test]
fn migrate_refuses_memory_backend() {
    let config_dir = std::env::temp_dir().join(format!("shelf-cli-memory-{}", std::process::id()));
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("base.toml"), "[database]\nbackend = \"memory\"\n").unwrap();

    Command::cargo_bin("shelf")
        .unwrap()
        .arg("--config-dir")
        .arg(&config_dir)
        .args(["--env", "local", "migrate"])
        .env_remove("RUST_LOG")
        .assert()
        .failure()
        .stderr(contains("memory backend"));

    std::fs::remove_dir_all(config_dir).ok();
}
