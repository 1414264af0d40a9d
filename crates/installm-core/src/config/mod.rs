use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::backend::SamplingParams;
use crate::constants::defaults;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub models: ModelSettings,
    #[serde(default)]
    pub inference: InferenceSettings,
    #[serde(default)]
    pub chat: ChatSettings,
    #[serde(default)]
    pub bitnet: BitNetSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceSettings {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub seed: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    /// The prompt goes to the model verbatim.
    SingleTurn,
    /// Preamble and full history are rendered through the delimiter template.
    MultiTurn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub mode: ChatMode,
    pub system_prompt: String,
    /// Oldest turns are dropped past this many; 0 keeps everything.
    pub max_turns: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BitNetSettings {
    pub python_path: String,
    pub script_path: PathBuf,
    pub threads: u32,
    pub ctx_size: u32,
    pub timeout_secs: Option<u64>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(defaults::MODELS_DIR),
        }
    }
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            max_tokens: defaults::MAX_TOKENS,
            temperature: defaults::TEMPERATURE,
            top_p: defaults::TOP_P,
            seed: defaults::SEED,
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            mode: ChatMode::MultiTurn,
            system_prompt: defaults::SYSTEM_PROMPT.to_string(),
            max_turns: defaults::MAX_TURNS,
        }
    }
}

impl Default for BitNetSettings {
    fn default() -> Self {
        Self {
            python_path: defaults::PYTHON_PATH.to_string(),
            script_path: PathBuf::from(defaults::BITNET_SCRIPT),
            threads: defaults::BITNET_THREADS,
            ctx_size: defaults::BITNET_CTX_SIZE,
            timeout_secs: None,
        }
    }
}

impl InferenceSettings {
    pub fn sampling_params(&self) -> SamplingParams {
        SamplingParams {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            seed: self.seed,
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("installm")
            .join("config.toml")
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Read settings from `path`, falling back to defaults when the file is
    /// missing or does not parse.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Ignoring invalid config {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Could not read config {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), crate::error::InstaError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), crate::error::InstaError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::InstaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
