#[path = "common/mod.rs"]
mod common;

use common::LexTest;
use lexscroll::config::{API_TOKEN_ENV, API_URL_ENV};
use lexscroll::{Config, LexError};
use secrecy::ExposeSecret;
use serial_test::serial;

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_missing_file_yields_defaults() {
    let lex = LexTest::new();
    let config = Config::load(Some(&lex.config_path())).unwrap();
    assert_eq!(config.controller.debounce_ms, 300);
    assert_eq!(config.controller.scroll_throttle_ms, 200);
    assert_eq!(config.controller.page_size, 20);
}

#[test]
fn test_load_partial_file() {
    let lex = LexTest::new();
    lex.write_config(
        "api:\n  base_url: https://search.example.org/v2\ncontroller:\n  dedupe: true\n",
    );

    let config = Config::load(Some(&lex.config_path())).unwrap();
    assert!(config.controller.dedupe);
    assert_eq!(config.controller.page_size, 20);
    assert_eq!(config.api.base_url, "https://search.example.org/v2");
}

#[test]
fn test_load_rejects_zero_page_size() {
    let lex = LexTest::new();
    lex.write_config("controller:\n  page_size: 0\n");

    let err = Config::load(Some(&lex.config_path())).unwrap_err();
    assert!(matches!(err, LexError::Config(_)));
}

#[test]
fn test_load_rejects_malformed_yaml() {
    let lex = LexTest::new();
    lex.write_config("controller: [unclosed\n");

    let err = Config::load(Some(&lex.config_path())).unwrap_err();
    assert!(matches!(err, LexError::YamlParse(_)));
}

#[test]
fn test_load_clamps_scroll_throttle() {
    let lex = LexTest::new();
    lex.write_config("controller:\n  scroll_throttle_ms: 50\n");

    let config = Config::load(Some(&lex.config_path())).unwrap();
    assert_eq!(config.controller.scroll_throttle_ms, 150);
}

#[test]
fn test_save_then_load() {
    let lex = LexTest::new();
    let mut config = Config::default();
    config.controller.page_size = 50;
    config.api.token = Some("tok_abc".to_string());
    config.save(&lex.config_path()).unwrap();

    let loaded = Config::load(Some(&lex.config_path())).unwrap();
    assert_eq!(loaded.controller.page_size, 50);
    assert_eq!(loaded.api.token.as_deref(), Some("tok_abc"));
}

// ============================================================================
// Environment overrides
// ============================================================================

#[test]
#[serial]
fn test_env_overrides_base_url_and_token() {
    let config = Config::default();
    unsafe {
        std::env::set_var(API_URL_ENV, "https://override.example.org/api");
        std::env::set_var(API_TOKEN_ENV, "tok_env");
    }

    let url = config.api.base_url().unwrap();
    let token = config.api.token();

    unsafe {
        std::env::remove_var(API_URL_ENV);
        std::env::remove_var(API_TOKEN_ENV);
    }

    assert_eq!(url.as_str(), "https://override.example.org/api/");
    assert_eq!(token.unwrap().expose_secret(), "tok_env");
}

#[test]
#[serial]
fn test_empty_env_falls_back_to_file() {
    let mut config = Config::default();
    config.api.token = Some("tok_file".to_string());
    unsafe {
        std::env::set_var(API_URL_ENV, "");
        std::env::set_var(API_TOKEN_ENV, "");
    }

    let url = config.api.base_url().unwrap();
    let token = config.api.token();

    unsafe {
        std::env::remove_var(API_URL_ENV);
        std::env::remove_var(API_TOKEN_ENV);
    }

    assert_eq!(url.as_str(), "http://localhost:8000/");
    assert_eq!(token.unwrap().expose_secret(), "tok_file");
}

// ============================================================================
// Config commands
// ============================================================================

#[test]
fn test_config_show_redacts_token() {
    let lex = LexTest::new();
    lex.write_config("api:\n  token: tok_secret_value\n");

    let output = lex.run_success(&["config", "show"]);
    assert!(output.contains("Configuration"));
    assert!(output.contains("[REDACTED]"));
    assert!(output.contains("configured"));
    assert!(!output.contains("tok_secret_value"));
}

#[test]
fn test_config_show_json() {
    let lex = LexTest::new();
    lex.write_config("api:\n  token: tok_secret_value\ncontroller:\n  page_size: 10\n");

    let output = lex.run_success(&["config", "show", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["api"]["token_configured"], true);
    assert_eq!(json["api"]["base_url"], "http://localhost:8000/");
    assert_eq!(json["controller"]["page_size"], 10);
    assert!(!output.contains("tok_secret_value"));
}

#[test]
fn test_config_show_invalid_file_fails() {
    let lex = LexTest::new();
    lex.write_config("api:\n  base_url: not a url\n");

    let stderr = lex.run_failure(&["config", "show"]);
    assert!(stderr.contains("configuration error"));
}

#[test]
fn test_config_path_prints_explicit_path() {
    let lex = LexTest::new();
    let output = lex.run_success(&["config", "path"]);
    assert_eq!(output.trim(), lex.config_path().display().to_string());
}
