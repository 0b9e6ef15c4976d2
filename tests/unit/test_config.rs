//! Environment-derived configuration

use form_platform_api::config::{AppConfig, ConfigError};
use serial_test::serial;
use std::collections::HashMap;
use std::time::Duration;

const SECRET: &str = "a-production-secret-that-is-long-enough";

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_production_defaults() {
    let config = AppConfig::from_vars(vars(&[("JWT_SECRET", SECRET)])).unwrap();

    assert_eq!(config.app_env, "production");
    assert!(!config.is_development());
    assert_eq!(config.port, 8081);
    assert_eq!(config.database_url, None);
    assert_eq!(config.token_ttl, chrono::Duration::minutes(60));
    assert_eq!(config.export_link_ttl, chrono::Duration::minutes(15));
    assert_eq!(config.sweep_interval, Duration::from_secs(60));
    assert!(config.cookie_secure);
    assert!(config.cors_origins.is_empty());
    assert_eq!(config.default_role, "viewer");
    assert!(config.admin.is_none());
    assert_eq!(config.public_base_url, "http://localhost:8081");
}

#[test]
fn test_production_requires_secret() {
    assert_eq!(
        AppConfig::from_vars(HashMap::new()).unwrap_err(),
        ConfigError::Missing("JWT_SECRET")
    );

    let err = AppConfig::from_vars(vars(&[("JWT_SECRET", "short")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { name: "JWT_SECRET", .. }));
}

#[test]
fn test_development_falls_back_to_dev_secret() {
    let config = AppConfig::from_vars(vars(&[("APP_ENV", "development")])).unwrap();

    assert!(config.is_development());
    assert!(config.jwt_secret.len() >= 32);
    assert!(!config.cookie_secure);
}

#[test]
fn test_invalid_numbers_name_the_variable() {
    let err = AppConfig::from_vars(vars(&[("JWT_SECRET", SECRET), ("PORT", "eighty")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));

    let err = AppConfig::from_vars(vars(&[("JWT_SECRET", SECRET), ("SWEEP_INTERVAL_SECS", "0")]))
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            name: "SWEEP_INTERVAL_SECS",
            ..
        }
    ));

    let err =
        AppConfig::from_vars(vars(&[("JWT_SECRET", SECRET), ("BCRYPT_COST", "2")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { name: "BCRYPT_COST", .. }));
}

#[test]
fn test_token_lifetimes_are_bounded() {
    let config = AppConfig::from_vars(vars(&[
        ("JWT_SECRET", SECRET),
        ("TOKEN_TTL_MINUTES", "525600"),
        ("EXPORT_LINK_TTL_MINUTES", "1"),
    ]))
    .unwrap();
    assert_eq!(config.token_ttl, chrono::Duration::minutes(525_600));
    assert_eq!(config.export_link_ttl, chrono::Duration::minutes(1));

    for value in ["9223372036854775807", "200000000000", "525601"] {
        let err = AppConfig::from_vars(vars(&[("JWT_SECRET", SECRET), ("TOKEN_TTL_MINUTES", value)]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "TOKEN_TTL_MINUTES",
                ..
            }
        ));
    }

    for value in ["-5", "0"] {
        let err = AppConfig::from_vars(vars(&[
            ("JWT_SECRET", SECRET),
            ("EXPORT_LINK_TTL_MINUTES", value),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "EXPORT_LINK_TTL_MINUTES",
                ..
            }
        ));
    }
}

#[test]
fn test_lists_admin_and_base_url() {
    let config = AppConfig::from_vars(vars(&[
        ("JWT_SECRET", SECRET),
        ("PORT", "9000"),
        ("CORS_ORIGINS", "https://a.example, https://b.example,,"),
        ("ADMIN_EMAIL", "root@example.com"),
        ("ADMIN_PASSWORD", "hunter22"),
        ("PUBLIC_BASE_URL", "https://forms.example/"),
        ("SWEEP_INTERVAL_SECS", "5"),
    ]))
    .unwrap();

    assert_eq!(config.port, 9000);
    assert_eq!(
        config.cors_origins,
        vec!["https://a.example".to_string(), "https://b.example".to_string()]
    );
    let admin = config.admin.unwrap();
    assert_eq!(admin.email, "root@example.com");
    assert_eq!(admin.name, "Administrator");
    assert_eq!(config.public_base_url, "https://forms.example");
    assert_eq!(config.sweep_interval, Duration::from_secs(5));
}

#[test]
fn test_admin_needs_both_email_and_password() {
    let config =
        AppConfig::from_vars(vars(&[("JWT_SECRET", SECRET), ("ADMIN_EMAIL", "root@example.com")]))
            .unwrap();
    assert!(config.admin.is_none());
}

#[test]
#[serial]
fn test_from_env_reads_process_environment() {
    // SAFETY: serialised with other environment-touching tests.
    unsafe {
        std::env::set_var("APP_ENV", "development");
        std::env::set_var("PORT", "8099");
    }

    let config = AppConfig::from_env().unwrap();
    assert!(config.is_development());
    assert_eq!(config.port, 8099);

    unsafe {
        std::env::remove_var("APP_ENV");
        std::env::remove_var("PORT");
    }
}
