//! Layered configuration using figment.
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. User-level `~/.config/eduzip/config.toml`
//! 3. Project-level `./eduzip.toml`
//! 4. Environment variables (`EDUZIP_` prefix, `__` separates sections,
//!    e.g. `EDUZIP_UPSTAGE__CHAT_MODEL`)
//! 5. `UPSTAGE_API_KEY`, the variable the hosted proxy reads
//!
//! `.env` loading is left to the binary.

use std::path::PathBuf;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

const PROJECT_CONFIG: &str = "eduzip.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub upstage: UpstageConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
}

impl AppConfig {
    /// Load and validate configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// The provider chain, exposed so callers can layer CLI overrides on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        let local_path = PathBuf::from(PROJECT_CONFIG);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment
            .merge(Env::prefixed("EDUZIP_").split("__"))
            .merge(
                Env::raw()
                    .only(&["UPSTAGE_API_KEY"])
                    .map(|_| "upstage.api_key".into()),
            )
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("eduzip").join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.upstage.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "upstage.temperature".into(),
                reason: format!("{} is outside 0.0..=2.0", self.upstage.temperature),
            });
        }
        if self.pipeline.max_prompt_chars == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.max_prompt_chars".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if !self.proxy.path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "proxy.path".into(),
                reason: format!("'{}' must start with '/'", self.proxy.path),
            });
        }
        Ok(())
    }
}

/// Upstage document-parse and chat endpoints, and how to reach them.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstageConfig {
    /// Bearer credential. Only needed for direct mode and for the proxy itself.
    pub api_key: String,
    /// Credential proxy URL. When set, requests go through the proxy and no
    /// key is needed on this side.
    pub proxy_url: String,
    pub parse_url: String,
    pub chat_url: String,
    pub parse_model: String,
    pub ocr: String,
    pub parse_mode: String,
    pub chat_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-request deadline in seconds; 0 disables it.
    pub request_timeout_secs: u64,
}

impl Default for UpstageConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            proxy_url: String::new(),
            parse_url: "https://api.upstage.ai/v1/document-digitization".into(),
            chat_url: "https://api.upstage.ai/v1/solar/chat/completions".into(),
            parse_model: "document-parse".into(),
            ocr: "force".into(),
            parse_mode: "enhanced".into(),
            chat_model: "solar-pro".into(),
            temperature: 0.1,
            max_tokens: 1000,
            request_timeout_secs: 300,
        }
    }
}

impl UpstageConfig {
    pub fn uses_proxy(&self) -> bool {
        !self.proxy_url.trim().is_empty()
    }

    /// A request can be attempted: either a key is present or a proxy holds it.
    pub fn is_configured(&self) -> bool {
        self.uses_proxy() || !self.api_key.trim().is_empty()
    }

    /// The key with all but its last four characters hidden.
    pub fn masked_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        match chars.len() {
            0 => "(not set)".into(),
            n if n <= 4 => "*".repeat(n),
            n => {
                let tail: String = chars[n - 4..].iter().collect();
                format!("{}{tail}", "*".repeat(n - 4))
            }
        }
    }
}

/// How a parsed document is turned into checklist rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Send the document text to the chat model.
    #[default]
    Ai,
    /// Read the checklist table straight out of the parsed HTML.
    Table,
}

impl AnalysisMode {
    /// Value of the parse call's `output_formats` option for this mode.
    pub fn output_formats(&self) -> &'static str {
        match self {
            Self::Ai => "['text', 'markdown']",
            Self::Table => "['text', 'markdown', 'html']",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub mode: AnalysisMode,
    /// Document text beyond this many characters is not sent to the model.
    pub max_prompt_chars: usize,
    pub supported_extensions: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::default(),
            max_prompt_chars: 8000,
            supported_extensions: vec![".pdf".into(), ".hwp".into()],
        }
    }
}

impl PipelineConfig {
    pub fn is_supported(&self, filename: &str) -> bool {
        let lower = filename.to_lowercase();
        self.supported_extensions
            .iter()
            .any(|ext| lower.ends_with(&ext.to_lowercase()))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub bind: String,
    pub path: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".into(),
            path: "/api/upstage".into(),
        }
    }
}
