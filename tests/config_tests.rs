// Config tests: parsing, validation, defaults, startup overrides

use appserver::config::AppConfig;

const FULL_CONFIG: &str = r#"
[server]
port = 8090
host = "0.0.0.0"
domain = "example.com"

[monitoring]
cache_ttl_ms = 1500
collect_timeout_ms = 4000

[stats]
recent_capacity = 50
rate_window_secs = 10

[jobs]
enabled = false
"#;

#[test]
fn test_full_config_parses() {
    let config = AppConfig::load_from_str(FULL_CONFIG).unwrap();
    assert_eq!(config.server.port, 8090);
    assert_eq!(config.server.domain.as_deref(), Some("example.com"));
    assert_eq!(config.monitoring.cache_ttl_ms, 1500);
    assert_eq!(config.stats.recent_capacity, 50);
    assert!(!config.jobs.enabled);
}

#[test]
fn test_minimal_config_uses_defaults() {
    let config = AppConfig::load_from_str(
        r#"
[server]
port = 8090
host = "127.0.0.1"
"#,
    )
    .unwrap();
    assert_eq!(config.monitoring.cache_ttl_ms, 2000);
    assert_eq!(config.monitoring.collect_timeout_ms, 5000);
    assert_eq!(config.stats.recent_capacity, 100);
    assert_eq!(config.stats.rate_window_secs, 5);
    assert!(config.jobs.enabled);
    assert!(config.server.domain.is_none());
}

#[test]
fn test_zero_port_rejected() {
    let result = AppConfig::load_from_str(
        r#"
[server]
port = 0
host = "0.0.0.0"
"#,
    );
    assert!(result.is_err());
}

#[test]
fn test_zero_cache_ttl_rejected() {
    let result = AppConfig::load_from_str(
        r#"
[server]
port = 8090
host = "0.0.0.0"

[monitoring]
cache_ttl_ms = 0
"#,
    );
    assert!(result.is_err());
}

#[test]
fn test_addr_override_replaces_host_and_port() {
    let mut config = AppConfig::load_from_str(FULL_CONFIG).unwrap();
    config
        .apply_overrides(Some("127.0.0.1:9000"), None)
        .unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 9000);
    // Domain untouched.
    assert_eq!(config.server.domain.as_deref(), Some("example.com"));
}

#[test]
fn test_domain_override() {
    let mut config = AppConfig::load_from_str(FULL_CONFIG).unwrap();
    config
        .apply_overrides(None, Some("internal.example.org"))
        .unwrap();
    assert_eq!(
        config.server.domain.as_deref(),
        Some("internal.example.org")
    );
}

#[test]
fn test_malformed_addr_override_rejected() {
    let mut config = AppConfig::load_from_str(FULL_CONFIG).unwrap();
    assert!(config.apply_overrides(Some("no-port"), None).is_err());
    assert!(config.apply_overrides(Some(":8080"), None).is_err());
    assert!(config.apply_overrides(Some("host:notaport"), None).is_err());
}
