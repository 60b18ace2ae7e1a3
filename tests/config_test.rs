//! Integration tests for configuration loading

use speedtrap::infra::Config;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[site]
id = "test-site"

[speed]
limit_mph = 30.0
tolerance_ratio = 0.05
monitor_floor_m = -80.0

[zones]
min_valid_m = -200.0
leaving_threshold_m = 25.0
max_valid_m = 100.0

[capture]
window_half_width_m = 25.0

[anpr]
plates = ["TST-0001"]

[uplink]
buffer_capacity = 16

[http]
bind_address = "127.0.0.1"
port = 9091

[metrics]
interval_secs = 15
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.site_id(), "test-site");
    assert_eq!(config.speed_limit_mph(), 30.0);
    assert_eq!(config.tolerance_ratio(), 0.05);
    assert_eq!(config.monitor_floor_m(), -80.0);
    assert_eq!(config.min_valid_m(), -200.0);
    assert_eq!(config.leaving_threshold_m(), 25.0);
    assert_eq!(config.max_valid_m(), 100.0);
    assert_eq!(config.capture_half_width_m(), 25.0);
    assert_eq!(config.anpr_plates(), &["TST-0001".to_string()]);
    assert_eq!(config.uplink_buffer_capacity(), 16);
    assert_eq!(config.http_bind_address(), "127.0.0.1");
    assert_eq!(config.http_port(), 9091);
    assert_eq!(config.metrics_interval_secs(), 15);
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.speed_limit_mph(), 40.0);
    assert_eq!(config.http_port(), 8080);
    assert_eq!(config.config_file(), "default");
}

#[test]
fn test_invalid_file_falls_back_to_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[zones]\nmax_valid_m = 10.0\n").unwrap();
    temp_file.flush().unwrap();

    assert!(Config::from_file(temp_file.path()).is_err());

    let path = temp_file.path().to_str().unwrap().to_string();
    let config = Config::load_from_path(&path);
    assert_eq!(config.max_valid_m(), 90.0);
}

#[test]
fn test_capture_window_must_match_leaving_threshold() {
    for window in ["30.0", "10.0"] {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "[capture]\nwindow_half_width_m = {}\n", window).unwrap();
        temp_file.flush().unwrap();

        let err = Config::from_file(temp_file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("window_half_width_m"));

        let path = temp_file.path().to_str().unwrap().to_string();
        let config = Config::load_from_path(&path);
        assert_eq!(config.capture_half_width_m(), 20.0);
    }
}
