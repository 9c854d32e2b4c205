use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::cache::TranslatorPatch;
use crate::error::{Error, Result};

/// Connection settings for the OpenAI-compatible model backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

const fn default_retry_count() -> u32 {
    crate::model::DEFAULT_RETRY_COUNT
}

const fn default_retry_delay_ms() -> u64 {
    crate::model::DEFAULT_RETRY_DELAY_MS
}

const fn default_timeout_secs() -> u64 {
    60
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Schema translator behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorSettings {
    /// Send one repair prompt when the reply fails validation
    #[serde(default = "default_true")]
    pub attempt_repair: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self {
            attempt_repair: true,
        }
    }
}

/// A translator registered in the config file.
///
/// The schema is given inline or as a path; relative paths resolve against
/// the directory of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslatorDefinition {
    pub model: Option<String>,
    pub schema: Option<String>,
    pub schema_path: Option<PathBuf>,
    #[serde(rename = "typeName", alias = "type_name")]
    pub type_name: Option<String>,
}

impl TranslatorDefinition {
    /// Turn the definition into a patch, reading the schema file if needed.
    pub fn to_patch(&self, base_dir: Option<&Path>) -> Result<TranslatorPatch> {
        let schema = match (&self.schema, &self.schema_path) {
            (Some(_), Some(_)) => {
                return Err(Error::ConfigInvalid {
                    field: "schema".to_string(),
                    reason: "set either schema or schema_path, not both".to_string(),
                });
            }
            (Some(inline), None) => Some(inline.clone()),
            (None, Some(path)) => {
                let path = base_dir.map_or_else(|| path.clone(), |dir| dir.join(path));
                Some(crate::util::read_schema(&path)?)
            }
            (None, None) => None,
        };

        Ok(TranslatorPatch {
            model: self.model.clone(),
            schema,
            type_name: self.type_name.clone(),
        })
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key used for every model client
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model backend configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// Schema translator configuration
    #[serde(default)]
    pub translator: TranslatorSettings,

    /// Translators configured at startup, by id
    #[serde(default)]
    pub translators: BTreeMap<String, TranslatorDefinition>,

    /// Directory of the file this config was loaded from
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut config = Self::parse(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Load from default locations (~/.config/json-translator/config.toml, ./config.toml)
    pub fn load() -> Self {
        // Try user config
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("json-translator").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // Try local config
        let local_config = PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }

    /// Resolve every registered translator into a patch
    pub fn translator_patches(&self) -> Result<Vec<(String, TranslatorPatch)>> {
        self.translators
            .iter()
            .map(|(id, def)| Ok((id.clone(), def.to_patch(self.base_dir.as_deref())?)))
            .collect()
    }
}
