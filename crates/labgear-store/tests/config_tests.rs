use std::collections::HashMap;

use labgear_store::{ConfigError, SystemConfigLoader};

#[test]
fn config_loader_accepts_valid_keys() {
    let input = r#"
[server]
host = "127.0.0.1"
port = 9090
[storage]
sqlite_path = "/var/lib/lab_gear/lab_gear.db"
[security]
api_token = "s3cret"
"#;
    let config = SystemConfigLoader::from_str(input).expect("config");
    assert_eq!(config.get_string("server.host"), "127.0.0.1");
    assert_eq!(config.get_number("server.port"), 9090);
    assert_eq!(config.get_string("storage.sqlite_path"), "/var/lib/lab_gear/lab_gear.db");
    assert_eq!(config.require_string("security.api_token").expect("token"), "s3cret");
}

#[test]
fn config_defaults_apply_when_empty() {
    let config = SystemConfigLoader::from_str("").expect("config");
    assert_eq!(config.get_number("server.port"), 8080);
    assert_eq!(config.get_number("server.max_body_bytes"), 65536);
    assert_eq!(config.get_string("storage.sqlite_path"), "./lab_gear.db");
    let err = config.require_string("security.api_token").expect_err("missing");
    match err {
        ConfigError::Missing(hint) => assert!(hint.contains("API_TOKEN")),
        _ => panic!("expected missing token error"),
    }
}

#[test]
fn config_loader_rejects_unknown_key() {
    let input = r#"
unknown = { value = "x" }
"#;
    let err = SystemConfigLoader::from_str(input).expect_err("error");
    match err {
        ConfigError::UnknownKey(key) => assert_eq!(key, "unknown.value"),
        _ => panic!("expected unknown key error"),
    }
}

#[test]
fn config_loader_rejects_type_mismatch() {
    let input = r#"
server = { port = "x" }
"#;
    let err = SystemConfigLoader::from_str(input).expect_err("error");
    match err {
        ConfigError::TypeMismatch(key, _) => assert_eq!(key, "server.port"),
        _ => panic!("expected type mismatch"),
    }
}

#[test]
fn environment_overrides_file_values() {
    let mut config = SystemConfigLoader::from_str(
        r#"
[server]
port = 9090
[security]
api_token = "from-file"
"#,
    )
    .expect("config");
    let env = HashMap::from([
        ("API_TOKEN", "from-env"),
        ("DB_PATH", "/tmp/lab.db"),
        ("PORT", ""),
    ]);
    config
        .apply_env(|var| env.get(var).map(|value| value.to_string()))
        .expect("env");

    assert_eq!(config.get_string("security.api_token"), "from-env");
    assert_eq!(config.get_string("storage.sqlite_path"), "/tmp/lab.db");
    assert_eq!(config.get_number("server.port"), 9090);
}

#[test]
fn environment_number_must_parse() {
    let mut config = SystemConfigLoader::from_str("").expect("config");
    let err = config
        .apply_env(|var| (var == "PORT").then(|| "eighty".to_string()))
        .expect_err("bad port");
    match err {
        ConfigError::TypeMismatch(var, _) => assert_eq!(var, "PORT"),
        _ => panic!("expected type mismatch"),
    }
}
