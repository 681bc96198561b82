use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::llm::{LlmProtocol, LlmSettings, Provider};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Fallback engine protocol: ollama, chat, rules or none
    #[arg(long)]
    pub fallback: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub engines: EnginesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Upper bound for a whole request, both engine calls included.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub json: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EnginesConfig {
    /// Per-call timeout for each engine's HTTP client.
    pub timeout_secs: u64,
    pub primary: EngineConfig,
    pub fallback: EngineConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    pub protocol: String,
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Azure deployment name (Azure `OpenAI` only).
    #[serde(default)]
    pub deployment_name: Option<String>,
    /// Azure API version (Azure `OpenAI` only).
    #[serde(default)]
    pub api_version: Option<String>,
}

impl EngineConfig {
    /// Engine settings with the given per-call timeout.
    #[must_use]
    pub fn to_settings(&self, timeout: Duration) -> LlmSettings {
        let mut provider = Provider::detect_from_url(&self.base_url);
        if let Provider::AzureOpenAI { .. } = &provider
            && let Some(deployment) = &self.deployment_name
        {
            provider = Provider::AzureOpenAI {
                deployment_name: deployment.clone(),
                api_version: self
                    .api_version
                    .clone()
                    .unwrap_or_else(|| "2024-08-01-preview".to_string()),
            };
        }

        LlmSettings {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: self.model.clone(),
            protocol: LlmProtocol::parse(&self.protocol),
            provider,
            timeout,
        }
    }
}

impl EnginesConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.request_timeout_secs", 75)?
            .set_default("logging.json", false)?
            .set_default("engines.timeout_secs", 30)?
            .set_default("engines.primary.protocol", "chat")?
            .set_default(
                "engines.primary.base_url",
                "https://generativelanguage.googleapis.com/v1beta/openai",
            )?
            .set_default("engines.primary.model", "gemini-2.0-flash")?
            .set_default("engines.fallback.protocol", "ollama")?
            .set_default("engines.fallback.base_url", "http://localhost:11434")?
            .set_default("engines.fallback.model", "llama3.2")?;

        // 2. Config file: explicit path, else ./config.{yaml,toml,json} when present
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // 3. Environment variables, e.g. SERQET_SERVER__PORT=9000
        builder = builder.add_source(
            Environment::with_prefix("SERQET")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 4. CLI flags win
        if let Some(host) = &cli.host {
            builder = builder.set_override("server.host", host.as_str())?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(fallback) = &cli.fallback {
            builder = builder.set_override("engines.fallback.protocol", fallback.as_str())?;
        }

        let mut cfg: Self = builder.build()?.try_deserialize()?;

        // Provider-native key names, for setups that already export them
        let primary = &mut cfg.engines.primary;
        primary.api_key = primary.api_key.take().filter(|k| !k.trim().is_empty());
        if primary.api_key.is_none() {
            primary.api_key = ["GEMINI_API_KEY", "LLM_API_KEY"]
                .iter()
                .filter_map(|name| std::env::var(name).ok())
                .find(|k| !k.trim().is_empty());
        }

        Ok(cfg)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(base_url: &str) -> EngineConfig {
        EngineConfig {
            protocol: "chat".to_string(),
            base_url: base_url.to_string(),
            model: "gpt-4o".to_string(),
            api_key: Some("  ".to_string()),
            deployment_name: Some("prod".to_string()),
            api_version: None,
        }
    }

    #[test]
    fn test_settings_blank_key_is_none() {
        let settings = engine("https://api.openai.com").to_settings(Duration::from_secs(3));
        assert!(settings.api_key.is_none());
        assert_eq!(settings.provider, Provider::OpenAI);
        assert_eq!(settings.protocol, LlmProtocol::Chat);
        assert_eq!(settings.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_settings_azure_deployment() {
        let settings =
            engine("https://acme.openai.azure.com").to_settings(Duration::from_secs(3));
        assert_eq!(
            settings.provider,
            Provider::AzureOpenAI {
                deployment_name: "prod".to_string(),
                api_version: "2024-08-01-preview".to_string(),
            }
        );
    }
}
