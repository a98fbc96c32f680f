use emeset::env::TESTING_VAR;
use emeset::{Config, Container};
use serial_test::serial;

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".env"), "EMESET_IT_DB = production\n").unwrap();
    std::fs::write(dir.path().join(".env.test"), "EMESET_IT_DB = testing\n").unwrap();
    dir
}

#[test]
#[serial]
fn test_container_loads_test_env_under_test() {
    let dir = project();
    std::env::set_var(TESTING_VAR, "1");

    let container = Container::with_root(Config::new(), dir.path());
    let env = container.env().unwrap();
    std::env::remove_var(TESTING_VAR);

    assert_eq!(env.get("EMESET_IT_DB").as_deref(), Some("testing"));
}

#[test]
#[serial]
fn test_container_loads_env_outside_test() {
    let dir = project();
    std::env::remove_var(TESTING_VAR);

    let container = Container::with_root(Config::new(), dir.path());
    let env = container.env().unwrap();

    assert_eq!(env.get("EMESET_IT_DB").as_deref(), Some("production"));
}

#[test]
#[serial]
fn test_process_environment_wins() {
    let dir = project();
    std::env::set_var("EMESET_IT_DB", "from-process");

    let container = Container::with_root(Config::new(), dir.path());
    let value = container.env().unwrap().get("EMESET_IT_DB");
    std::env::remove_var("EMESET_IT_DB");

    assert_eq!(value.as_deref(), Some("from-process"));
}

#[test]
fn test_missing_key_returns_default() {
    let dir = tempfile::tempdir().unwrap();
    let container = Container::with_root(Config::new(), dir.path());
    let env = container.env().unwrap();
    assert_eq!(env.get_or("EMESET_IT_NOT_SET", "fallback"), "fallback");
}
