//! Integration tests for configuration loading.

use std::io::Write;

use lb_core::config::{CacheBackendKind, Config};
use lb_core::ImageFormat;

#[test]
fn load_explicit_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[server]
port = 9100

[images]
min_thumb_size = 100
format = "png"

[cache]
ttl_secs = 30
prefix = "lb-test:"
"#
    )
    .unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.images.min_thumb_size, 100);
    assert_eq!(config.images.format, ImageFormat::Png);
    assert_eq!(config.cache.ttl_secs, 30);
    assert_eq!(config.cache.prefix, "lb-test:");
    assert_eq!(config.cache.backend, CacheBackendKind::Memory);
    assert!(config.validate().unwrap().is_empty());
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::load(Some(&dir.path().join("absent.toml"))).is_err());
}

#[test]
fn invalid_toml_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[server\nport = ").unwrap();
    assert!(Config::load(Some(file.path())).is_err());
}

#[test]
fn rendered_config_round_trips() {
    let config = Config::default();
    let rendered = toml::to_string_pretty(&config).unwrap();
    let parsed = Config::from_toml(&rendered).unwrap();
    assert_eq!(parsed.server.port, config.server.port);
    assert_eq!(parsed.workers.threads, config.workers.threads);
}
