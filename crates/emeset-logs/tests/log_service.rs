use std::fs;
use std::sync::Arc;

use emeset::http::Session;
use emeset::{Config, Container};
use emeset_logs::flag::{self, FLAG_VAR};
use emeset_logs::{register, Level, Log, LogSink, MemorySink, DB_SERVICE};
use serial_test::serial;

fn container_in(root: &std::path::Path) -> Container {
    let container = Container::with_root(Config::new(), root);
    register(&container);
    container
}

#[test]
#[serial]
fn test_registered_log_writes_to_db_service() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join(".env"),
        "LOG_USE_TRACING = false\nsession_user = user\nsession_userRole = role\nsession_userNickname = nick\n",
    )
    .unwrap();

    let container = container_in(tmp.path());
    let db = MemorySink::new();
    container.instance(DB_SERVICE, Arc::new(db.clone()) as Arc<dyn LogSink>);
    container
        .get::<Session>("session")
        .unwrap()
        .set("user", serde_json::json!({"role": "member"}));

    let log = container.get::<Log>("log").unwrap();
    log.do_log("orders", "order 7 shipped", "notice", false).unwrap();

    let records = db.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].channel, "orders");
    assert_eq!(records[0].user, "user");
    assert_eq!(records[0].level, Level::Notice);
}

#[test]
#[serial]
fn test_registered_log_defaults_to_project_files() {
    let tmp = tempfile::tempdir().unwrap();
    let container = container_in(tmp.path());

    let log = container.get::<Log>("log").unwrap();
    assert_eq!(log.root(), tmp.path());
    log.do_log("cron", "nightly cleanup", "error", true).unwrap();

    let entry = fs::read_dir(tmp.path().join("Log"))
        .unwrap()
        .next()
        .unwrap()
        .unwrap();
    let content = fs::read_to_string(entry.path()).unwrap();
    assert!(content.contains("ERROR: [cron] (cron) nightly cleanup"));
}

#[test]
#[serial]
fn test_process_env_overrides_manifest_scan() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("Cargo.toml"), "[dependencies]\nserde = \"1\"\n").unwrap();

    std::env::set_var(FLAG_VAR, "true");
    let detected = flag::detect(tmp.path(), &emeset::Env::new());
    std::env::remove_var(FLAG_VAR);

    assert!(detected);
    assert!(!tmp.path().join(".env").exists());
}

#[test]
#[serial]
fn test_scan_without_tracing_persists_false() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("Cargo.toml"), "[dependencies]\nserde = \"1\"\n").unwrap();

    assert!(!flag::detect(tmp.path(), &emeset::Env::new()));
    let env = fs::read_to_string(tmp.path().join(".env")).unwrap();
    assert!(env.contains("LOG_USE_TRACING = false"));
}
