use sqlweave::{DangerousDmlPolicy, Dialect, NamingStrategy, Weave, WeaveConfig, WeaveError};

#[test]
fn load_from_file() {
    let path = std::env::temp_dir().join(format!("sqlweave-config-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        r#"
dialect = "postgres"
naming = "snake_case"
update_without_where = "allow"
log_statements = false
"#,
    )
    .unwrap();

    let config = WeaveConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.dialect, Dialect::Postgres);
    assert_eq!(config.naming, NamingStrategy::SnakeCase);
    assert_eq!(config.update_without_where, DangerousDmlPolicy::Allow);
    assert_eq!(config.delete_without_where, DangerousDmlPolicy::Error);
    assert!(!config.log_statements);

    let db = Weave::from_config(config);
    assert_eq!(db.driver().name(), "postgres");
}

#[test]
fn missing_file_is_config_error() {
    let err = WeaveConfig::load("/nonexistent/sqlweave.toml").unwrap_err();
    match err {
        WeaveError::Config(message) => assert!(message.contains("failed to read config file")),
        other => panic!("unexpected error: {other}"),
    }
}
