use rebuild_hook::load_config::{load_config, ConfigShape, AUTHORIZATION_ENV, URL_ENV};
use rebuild_hook_core::config::{MethodSelection, DEFAULT_TIMEOUT_SECS};
use rebuild_hook_core::contract::HookMethod;
use serial_test::serial;
use std::env;
use std::fs::write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn config_file(yaml: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), yaml).expect("write temp config");
    file
}

fn clear_env() {
    env::remove_var(URL_ENV);
    env::remove_var(AUTHORIZATION_ENV);
}

#[test]
#[serial]
fn loads_full_website_build_section() {
    clear_env();
    let file = config_file(
        r#"
website_build:
  enabled: true
  url: https://api.example.com/build_hooks/abc
  authorization: "Bearer xyz"
  content: '{"trigger":"cms"}'
  timeout_secs: 10
  retry:
    max_attempts: 3
    backoff_ms: 250
"#,
    );

    let config = load_config(file.path()).expect("config should load");
    assert_eq!(config.shape, ConfigShape::WebsiteBuild);
    let hook = &config.website_build;
    assert!(hook.enabled);
    assert_eq!(hook.url, "https://api.example.com/build_hooks/abc");
    assert_eq!(hook.authorization.as_deref(), Some("Bearer xyz"));
    assert_eq!(hook.content.as_deref(), Some("{\"trigger\":\"cms\"}"));
    assert_eq!(hook.method, MethodSelection::Auto);
    assert_eq!(hook.timeout_secs, 10);
    assert_eq!(hook.retry.max_attempts, 3);
    assert_eq!(hook.retry.backoff_ms, 250);
}

#[test]
#[serial]
fn missing_fields_fall_back_to_defaults() {
    clear_env();
    let file = config_file("website_build:\n  url: https://example.com/hook\n");

    let hook = load_config(file.path()).expect("config should load").website_build;
    assert!(!hook.enabled, "hooks are off unless enabled explicitly");
    assert_eq!(hook.authorization, None);
    assert_eq!(hook.content, None);
    assert_eq!(hook.timeout_secs, 30);
    assert_eq!(hook.retry.attempts(), 1);
}

#[test]
#[serial]
fn zero_timeout_loads_as_the_default_deadline() {
    clear_env();
    let file = config_file("website_build:\n  enabled: true\n  url: https://example.com/hook\n  timeout_secs: 0\n");

    let hook = load_config(file.path()).expect("config should load").website_build;
    let request = hook.resolve().expect("hook is enabled");
    assert_eq!(request.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
}

#[test]
#[serial]
fn front_end_build_hook_is_an_enabled_empty_post() {
    clear_env();
    let file = config_file("front_end_build_hook: https://example.com/legacy\n");

    let config = load_config(file.path()).expect("config should load");
    assert_eq!(config.shape, ConfigShape::FrontEndBuildHook);
    let request = config.website_build.resolve().expect("hook is enabled");
    assert_eq!(request.method, HookMethod::Post);
    assert_eq!(request.url, "https://example.com/legacy");
    assert_eq!(request.body.as_deref(), Some(""));
}

#[test]
#[serial]
fn structured_section_wins_over_legacy_url() {
    clear_env();
    let file = config_file(
        "front_end_build_hook: https://example.com/legacy\nwebsite_build:\n  enabled: true\n  url: https://example.com/new\n",
    );

    let config = load_config(file.path()).expect("config should load");
    assert_eq!(config.shape, ConfigShape::WebsiteBuild);
    assert_eq!(config.website_build.url, "https://example.com/new");
}

#[test]
#[serial]
fn environment_overrides_url_and_authorization() {
    clear_env();
    let file = config_file(
        "website_build:\n  enabled: true\n  url: https://example.com/from-file\n  authorization: file-token\n",
    );
    env::set_var(URL_ENV, "https://example.com/from-env");
    env::set_var(AUTHORIZATION_ENV, "Bearer env-token");

    let hook = load_config(file.path()).expect("config should load").website_build;
    clear_env();

    assert_eq!(hook.url, "https://example.com/from-env");
    assert_eq!(hook.authorization.as_deref(), Some("Bearer env-token"));
}

#[test]
#[serial]
fn file_without_any_hook_section_is_rejected() {
    clear_env();
    let file = config_file("logging:\n  level: debug\n");

    let err = load_config(file.path()).unwrap_err();
    assert!(
        err.to_string().contains("website_build"),
        "unexpected error: {err}"
    );
}

#[test]
#[serial]
fn invalid_yaml_is_reported_as_a_parse_error() {
    clear_env();
    let file = config_file("not-yaml: [:::");

    let msg = load_config(file.path()).unwrap_err().to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
#[serial]
fn unknown_method_is_rejected() {
    clear_env();
    let file = config_file("website_build:\n  enabled: true\n  url: https://example.com\n  method: put\n");

    assert!(load_config(file.path()).is_err());
}

#[test]
#[serial]
fn missing_file_is_reported() {
    clear_env();
    let msg = load_config("/definitely/not/here.yaml")
        .unwrap_err()
        .to_string();
    assert!(msg.contains("Failed to read config file"), "got: {msg}");
}
