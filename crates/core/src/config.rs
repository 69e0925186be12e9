use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub links: LinkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub credentials_path: Option<String>,
    /// Unset means every folder is listed live.
    #[serde(default)]
    pub snapshot_path: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            credentials_path: None,
            snapshot_path: None,
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl LinkConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_ttl_secs() -> u64 {
    3600
}

/// Reads `path` (or `config/default` if present) and then `MOODMUSIC__*`
/// environment variables, e.g. `MOODMUSIC__STORAGE__BUCKET`.
pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("MOODMUSIC")
            .prefix_separator("__")
            .separator("__"),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
