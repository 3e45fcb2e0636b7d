//! Configuration management for botrot-rs.
//!
//! Loads config from YAML files in standard locations. Every section has
//! defaults, so a missing or partial file is fine.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_ENDPOINT: &str = "https://rotbot-production.up.railway.app/api/brainrot/";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub program: String,
    /// espeak words per minute at rate 1.0
    pub words_per_minute: u32,
    /// espeak pitch (0-99) at pitch 1.0
    pub base_pitch: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            program: "espeak-ng".into(),
            words_per_minute: 175,
            base_pitch: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoicesConfig {
    pub preferred: Option<String>,
    pub poll_interval_secs: u64,
}

impl Default for VoicesConfig {
    fn default() -> Self {
        Self {
            preferred: None,
            poll_interval_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 8768,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub transform: TransformConfig,
    pub speech: SpeechConfig,
    pub voices: VoicesConfig,
    pub api: ApiConfig,
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./botrot.yaml
    /// 2. ~/.config/botrot/config.yaml
    /// 3. /etc/botrot/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("botrot.yaml")),
                dirs::home_dir().map(|h| h.join(".config/botrot/config.yaml")),
                Some(PathBuf::from("/etc/botrot/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(contents)
    }
}
