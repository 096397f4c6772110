use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "deepseek/deepseek-r1-0528-qwen3-8b:free";
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Alternative Bot API server, e.g. a self-hosted one
    pub api_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl LlmConfig {
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Optional non-secret settings read from TOML. Credentials only come from the environment.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    telegram: FileTelegramConfig,
    #[serde(default)]
    llm: FileLlmConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FileTelegramConfig {
    api_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FileLlmConfig {
    model: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl FileConfig {
    /// An explicitly named file must exist; the default one is skipped when absent.
    fn read(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

impl Config {
    /// Load `.env`, the optional TOML file and the process environment.
    pub fn load() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e).context("Failed to load .env file"),
        }

        let explicit = std::env::var_os("RELAYBOT_CONFIG").map(PathBuf::from);
        let file = FileConfig::read(explicit.as_deref())?;

        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    fn from_sources(file: FileConfig, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bot_token = var("TELEGRAM_BOT_TOKEN").context(
            "TELEGRAM_BOT_TOKEN is not set. Add the Telegram bot token to the environment or .env file",
        )?;
        let api_key = var("OPENROUTER_API_KEY").context(
            "OPENROUTER_API_KEY is not set. Add the OpenRouter API key to the environment or .env file",
        )?;

        let timeout_secs = match var("OPENROUTER_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("OPENROUTER_TIMEOUT_SECS is not a number: {raw}"))?,
            None => file.llm.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            anyhow::bail!("Completion timeout must be greater than zero seconds");
        }

        Ok(Self {
            telegram: TelegramConfig {
                bot_token,
                api_url: var("TELEGRAM_API_URL").or(file.telegram.api_url),
            },
            llm: LlmConfig {
                api_key,
                model: var("OPENROUTER_MODEL")
                    .or(file.llm.model)
                    .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url: var("OPENROUTER_BASE_URL")
                    .or(file.llm.base_url)
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}
