//! Credential loading via env-var fallback.
//!
//! These tests mutate process-global env vars and must run serially.
//! They assume no `due-notify` keychain entries exist on the test host.

use due_notify::config::GlobalConfig;

fn make_config() -> GlobalConfig {
    GlobalConfig::from_toml_str(
        r#"
database_path = "tasks.db"

[delivery]
endpoint = "https://api.mail.example.com/emails"
from_address = "noreply@example.com"
"#,
    )
    .expect("config parses")
}

#[tokio::test]
#[serial_test::serial]
async fn env_var_credentials_are_loaded() {
    let mut config = make_config();
    std::env::set_var("DUE_NOTIFY_DELIVERY_API_KEY", "re_test_key");
    std::env::set_var("DUE_NOTIFY_TRIGGER_TOKEN", "trigger-123");

    let result = config.load_credentials().await;

    std::env::remove_var("DUE_NOTIFY_DELIVERY_API_KEY");
    std::env::remove_var("DUE_NOTIFY_TRIGGER_TOKEN");

    result.expect("credentials load");
    assert_eq!(config.delivery.api_key, "re_test_key");
    assert_eq!(config.trigger_token.as_deref(), Some("trigger-123"));
}

#[tokio::test]
#[serial_test::serial]
async fn trigger_token_is_optional() {
    let mut config = make_config();
    std::env::set_var("DUE_NOTIFY_DELIVERY_API_KEY", "re_test_key");
    std::env::remove_var("DUE_NOTIFY_TRIGGER_TOKEN");

    let result = config.load_credentials().await;
    std::env::remove_var("DUE_NOTIFY_DELIVERY_API_KEY");

    result.expect("credentials load");
    assert!(config.trigger_token.is_none());
}

#[tokio::test]
#[serial_test::serial]
async fn missing_api_key_names_env_var() {
    let mut config = make_config();
    std::env::remove_var("DUE_NOTIFY_DELIVERY_API_KEY");

    let err = config.load_credentials().await.expect_err("no api key");
    let msg = err.to_string();
    assert!(msg.starts_with("config:"), "{msg}");
    assert!(msg.contains("DUE_NOTIFY_DELIVERY_API_KEY"), "{msg}");
}

#[tokio::test]
#[serial_test::serial]
async fn blank_api_key_counts_as_missing() {
    let mut config = make_config();
    std::env::set_var("DUE_NOTIFY_DELIVERY_API_KEY", "   ");

    let result = config.load_credentials().await;
    std::env::remove_var("DUE_NOTIFY_DELIVERY_API_KEY");

    assert!(result.is_err());
}
