// Config loading and validation tests

use parking_monitor::config::AppConfig;

const VALID_CONFIG: &str = r#"
[server]
port = 8090
host = "0.0.0.0"

[serial]
port = "COM6"
baud_rate = 9600

[storage]
path = "data/parking_data.json"

[publishing]
broadcast_capacity = 64
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.server.port, 8090);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.serial.port, "COM6");
    assert_eq!(config.serial.baud_rate, 9600);
    assert_eq!(config.storage.path, "data/parking_data.json");
    assert_eq!(config.publishing.broadcast_capacity, 64);
}

#[test]
fn test_config_defaults_when_omitted() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("valid");
    assert_eq!(config.serial.read_timeout_ms, 1000);
    assert_eq!(config.serial.reset_delay_ms, 2000);
    assert_eq!(config.serial.poll_interval_ms, 100);
    assert_eq!(config.storage.autosave_every, 10);
    assert_eq!(config.storage.writer_queue_capacity, 16);
}

#[test]
fn test_config_explicit_values_override_defaults() {
    let s = VALID_CONFIG.replace(
        "baud_rate = 9600",
        "baud_rate = 115200\nread_timeout_ms = 250\nreset_delay_ms = 0\npoll_interval_ms = 20",
    );
    let config = AppConfig::load_from_str(&s).expect("valid");
    assert_eq!(config.serial.baud_rate, 115200);
    assert_eq!(config.serial.read_timeout_ms, 250);
    assert_eq!(config.serial.reset_delay_ms, 0);
    assert_eq!(config.serial.poll_interval_ms, 20);
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    let bad = VALID_CONFIG.replace("port = 8090", "port = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.port"));
}

#[test]
fn test_config_validation_rejects_empty_serial_port() {
    let bad = VALID_CONFIG.replace("port = \"COM6\"", "port = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("serial.port"));
}

#[test]
fn test_config_validation_rejects_baud_rate_zero() {
    let bad = VALID_CONFIG.replace("baud_rate = 9600", "baud_rate = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("baud_rate"));
}

#[test]
fn test_config_validation_rejects_poll_interval_zero() {
    let bad = VALID_CONFIG.replace("baud_rate = 9600", "baud_rate = 9600\npoll_interval_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("poll_interval_ms"));
}

#[test]
fn test_config_validation_rejects_read_timeout_zero() {
    let bad = VALID_CONFIG.replace("baud_rate = 9600", "baud_rate = 9600\nread_timeout_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("read_timeout_ms"));
}

#[test]
fn test_config_validation_rejects_empty_storage_path() {
    let bad = VALID_CONFIG.replace("path = \"data/parking_data.json\"", "path = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("storage.path"));
}

#[test]
fn test_config_validation_rejects_autosave_every_zero() {
    let bad = VALID_CONFIG.replace(
        "path = \"data/parking_data.json\"",
        "path = \"data/parking_data.json\"\nautosave_every = 0",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("autosave_every"));
}

#[test]
fn test_config_validation_rejects_writer_queue_capacity_zero() {
    let bad = VALID_CONFIG.replace(
        "path = \"data/parking_data.json\"",
        "path = \"data/parking_data.json\"\nwriter_queue_capacity = 0",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("writer_queue_capacity"));
}

#[test]
fn test_config_validation_rejects_broadcast_capacity_zero() {
    let bad = VALID_CONFIG.replace("broadcast_capacity = 64", "broadcast_capacity = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("broadcast_capacity"));
}

#[test]
fn test_config_rejects_missing_serial_section() {
    let bad = VALID_CONFIG.replace("[serial]\nport = \"COM6\"\nbaud_rate = 9600\n", "");
    assert!(AppConfig::load_from_str(&bad).is_err());
}

#[test]
fn test_config_validation_rejects_invalid_toml() {
    let err = AppConfig::load_from_str("not valid toml [[[").unwrap_err();
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_config_load_from_file_via_env() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, VALID_CONFIG).unwrap();
    unsafe { std::env::set_var("CONFIG_FILE", path.to_str().unwrap()) };
    let result = AppConfig::load();
    unsafe { std::env::remove_var("CONFIG_FILE") };
    let config = result.expect("load from CONFIG_FILE");
    assert_eq!(config.server.port, 8090);
    assert_eq!(config.storage.path, "data/parking_data.json");
}
