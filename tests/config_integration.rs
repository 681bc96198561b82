use serial_test::serial;
use serqet_brain::config::AppConfig;
use serqet_brain::llm::LlmProtocol;
use std::env;
use std::fs;
use std::io::Write;
use std::time::Duration;

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("SERQET_SERVER__PORT");
        env::remove_var("SERQET_ENGINES__FALLBACK__MODEL");
        env::remove_var("SERQET_ENGINES__PRIMARY__API_KEY");
        env::remove_var("SERQET_LOGGING__JSON");
        env::remove_var("GEMINI_API_KEY");
        env::remove_var("LLM_API_KEY");
        env::remove_var("CONFIG_FILE");
        env::remove_var("PORT");
    }
}

// Test harness flags would confuse clap, so every test passes explicit args.
fn load(args: &[&str]) -> AppConfig {
    let mut argv = vec!["serqet-brain"];
    argv.extend_from_slice(args);
    AppConfig::load_from_args(argv).expect("Failed to load config")
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = load(&[]);
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert!(!config.logging.json);
    assert_eq!(config.engines.primary.model, "gemini-2.0-flash");
    assert!(config.engines.primary.api_key.is_none());
    assert_eq!(config.engines.fallback.base_url, "http://localhost:11434");

    let fallback = config
        .engines
        .fallback
        .to_settings(config.engines.timeout());
    assert_eq!(fallback.protocol, LlmProtocol::Ollama);
    assert_eq!(fallback.timeout, Duration::from_secs(30));
    assert!(config.request_timeout() > config.engines.timeout() * 2);
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("SERQET_SERVER__PORT", "9090");
        env::set_var("SERQET_ENGINES__FALLBACK__MODEL", "qwen2.5");
        env::set_var("SERQET_LOGGING__JSON", "true");
    }

    let config = load(&[]);
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.engines.fallback.model, "qwen2.5");
    assert!(config.logging.json);

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env_vars();
    unsafe {
        env::set_var("SERQET_SERVER__PORT", "9090");
    }

    let config = load(&["--port", "7000", "--host", "127.0.0.1", "--fallback", "rules"]);
    assert_eq!(config.server.port, 7000);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.engines.fallback.protocol, "rules");

    clear_env_vars();
}

#[test]
#[serial]
fn test_primary_key_fallback_order() {
    clear_env_vars();
    unsafe {
        env::set_var("LLM_API_KEY", "generic-key");
    }
    assert_eq!(
        load(&[]).engines.primary.api_key.as_deref(),
        Some("generic-key")
    );

    unsafe {
        env::set_var("GEMINI_API_KEY", "gemini-key");
    }
    assert_eq!(
        load(&[]).engines.primary.api_key.as_deref(),
        Some("gemini-key")
    );

    unsafe {
        env::set_var("SERQET_ENGINES__PRIMARY__API_KEY", "configured-key");
    }
    assert_eq!(
        load(&[]).engines.primary.api_key.as_deref(),
        Some("configured-key")
    );

    clear_env_vars();
}

#[test]
#[serial]
fn test_blank_configured_key_uses_env_fallback() {
    clear_env_vars();

    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("Failed to create temp config");
    write!(
        file,
        r#"
engines:
  primary:
    api_key: "  "
"#
    )
    .expect("Failed to write temp config");

    unsafe {
        env::set_var("CONFIG_FILE", file.path());
        env::set_var("GEMINI_API_KEY", "");
        env::set_var("LLM_API_KEY", "generic-key");
    }

    let config = load(&[]);
    assert_eq!(config.engines.primary.api_key.as_deref(), Some("generic-key"));

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("Failed to create temp config");
    write!(
        file,
        r#"
server:
  port: 7070
engines:
  primary:
    base_url: "https://api.openai.com"
    model: "gpt-4o-mini"
  fallback:
    protocol: "none"
"#
    )
    .expect("Failed to write temp config");

    // Tell AppConfig to use this file via Env Var (mocking CLI arg indirectly)
    unsafe {
        env::set_var("CONFIG_FILE", file.path());
    }

    let config = load(&[]);
    assert_eq!(config.server.port, 7070);
    assert_eq!(config.engines.primary.model, "gpt-4o-mini");
    // Keys the file leaves out keep their defaults
    assert_eq!(config.engines.primary.protocol, "chat");
    assert_eq!(config.engines.fallback.model, "llama3.2");

    let fallback = config
        .engines
        .fallback
        .to_settings(config.engines.timeout());
    assert_eq!(fallback.protocol, LlmProtocol::Disabled);

    clear_env_vars();
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    clear_env_vars();

    let result = AppConfig::load_from_args(["serqet-brain", "--config", "does-not-exist.yaml"]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_cwd_config_fallback() {
    clear_env_vars();

    // Create ./config.yaml
    let config_content = r#"
server:
  port: 6060
    "#;
    let cwd_path = "config.yaml";
    fs::write(cwd_path, config_content).expect("Failed to write ./config.yaml");

    // No Env var, No CLI: should pick up ./config.yaml
    let config = load(&[]);

    let result = std::panic::catch_unwind(|| {
        assert_eq!(config.server.port, 6060);
    });

    fs::remove_file(cwd_path).unwrap();

    if let Err(e) = result {
        std::panic::resume_unwind(e);
    }
}
