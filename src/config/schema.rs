use crate::error::ConfigError;
use crate::modes::{HeartbeatMode, TimeBucket, default_modes};
use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Workspace directory - computed from home, not serialized
    #[serde(skip)]
    pub workspace_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Display name used in generated prompts
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    #[serde(default)]
    pub heartbeat: HeartbeatConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub speech: SpeechConfig,

    /// Heartbeat behavior modes. Loaded once; immutable for the process.
    #[serde(default = "default_modes", rename = "mode")]
    pub modes: Vec<HeartbeatMode>,
}

fn default_instance_name() -> String {
    "Vigil".into()
}

impl Default for Config {
    fn default() -> Self {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        let vigil_dir = home.join(".vigil");
        Self {
            workspace_dir: vigil_dir.join("workspace"),
            config_path: vigil_dir.join("config.toml"),
            instance_name: default_instance_name(),
            heartbeat: HeartbeatConfig::default(),
            generator: GeneratorConfig::default(),
            speech: SpeechConfig::default(),
            modes: default_modes(),
        }
    }
}

// ── Heartbeat ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between autonomous ticks
    #[serde(default = "default_heartbeat_interval")]
    pub interval_secs: u64,
    /// Queue generated thoughts for speech as well as writing them to the vault
    #[serde(default)]
    pub speak_thoughts: bool,
}

fn default_heartbeat_interval() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_heartbeat_interval(),
            speak_thoughts: false,
        }
    }
}

// ── Generator (local LLM endpoint) ──────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Base URL of the Ollama-compatible endpoint
    #[serde(default = "default_generator_url")]
    pub base_url: String,
    #[serde(default = "default_generator_model")]
    pub model: String,
    /// Hard budget for one generation call
    #[serde(default = "default_generator_timeout")]
    pub timeout_secs: u64,
}

fn default_generator_url() -> String {
    "http://localhost:11434".into()
}

fn default_generator_model() -> String {
    "dolphin-mistral:7b".into()
}

fn default_generator_timeout() -> u64 {
    120
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: default_generator_url(),
            model: default_generator_model(),
            timeout_secs: default_generator_timeout(),
        }
    }
}

// ── Speech (TTS adapter) ────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// When false, drained messages are logged instead of spoken
    #[serde(default)]
    pub enabled: bool,
    /// TTS engine command: "edge-tts" or "piper"
    #[serde(default = "default_speech_engine")]
    pub engine: String,
    /// Voice name (edge-tts) or model path (piper)
    #[serde(default = "default_speech_voice")]
    pub voice: String,
    /// Audio player command, invoked with the rendered file
    #[serde(default = "default_speech_player")]
    pub player: String,
}

fn default_speech_engine() -> String {
    "edge-tts".into()
}

fn default_speech_voice() -> String {
    "en-US-GuyNeural".into()
}

fn default_speech_player() -> String {
    "ffplay".into()
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            engine: default_speech_engine(),
            voice: default_speech_voice(),
            player: default_speech_player(),
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let vigil_dir = home.join(".vigil");
        let config_path = vigil_dir.join("config.toml");

        if !vigil_dir.exists() {
            fs::create_dir_all(&vigil_dir).context("Failed to create .vigil directory")?;
            fs::create_dir_all(vigil_dir.join("workspace"))
                .context("Failed to create workspace directory")?;
        }

        let config = if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            // Set computed paths that are skipped during serialization
            config.config_path.clone_from(&config_path);
            config.workspace_dir = vigil_dir.join("workspace");
            config
        } else {
            let config = Config {
                workspace_dir: vigil_dir.join("workspace"),
                config_path: config_path.clone(),
                ..Config::default()
            };
            config.save()?;
            config
        };

        config.validate_modes()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }

    /// Every time bucket must have at least one mode with nonzero weight,
    /// otherwise selection is undefined for that part of the day.
    pub fn validate_modes(&self) -> std::result::Result<(), ConfigError> {
        if self.modes.is_empty() {
            return Err(ConfigError::Validation("no heartbeat modes defined".into()));
        }
        for bucket in [TimeBucket::Morning, TimeBucket::Day, TimeBucket::Night] {
            if self.modes.iter().all(|m| m.weight(bucket) == 0) {
                return Err(ConfigError::Validation(format!(
                    "no mode has a nonzero weight for the {bucket} bucket"
                )));
            }
        }
        Ok(())
    }

    // ── Derived paths ───────────────────────────────────────────

    pub fn outbox_dir(&self) -> PathBuf {
        self.workspace_dir.join("outbox")
    }

    pub fn vault_dir(&self) -> PathBuf {
        self.workspace_dir.join("vault")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.workspace_dir.join("daemon.lock")
    }

    pub fn memory_path(&self) -> PathBuf {
        self.workspace_dir.join("memory/working_memory.json")
    }
}
