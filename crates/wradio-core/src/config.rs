use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

/// Catalog source — a local stations file (JSON or TOML) or an https:// URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to a local stations file (highest priority).
    /// Defaults to `$XDG_CONFIG_HOME/wradio/stations.json`.
    #[serde(default = "default_stations_path")]
    pub stations_path: PathBuf,
    /// URL for a JSON stations document (fallback when no local file exists).
    #[serde(default)]
    pub stations_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_eq_bar_count")]
    pub eq_bar_count: usize,
    /// Logical scope surface size; the terminal binding maps this onto cells.
    #[serde(default = "default_scope_width")]
    pub scope_width: u32,
    #[serde(default = "default_scope_height")]
    pub scope_height: u32,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_volume_pct")]
    pub default_volume_pct: u8,
    #[serde(default = "default_tone_pct")]
    pub default_tone_pct: u8,
    /// Simulated track length before a natural end-of-track fires.
    #[serde(default = "default_sim_track_secs")]
    pub sim_track_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            stations_path: default_stations_path(),
            stations_url: String::new(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            eq_bar_count: default_eq_bar_count(),
            scope_width: default_scope_width(),
            scope_height: default_scope_height(),
            frame_rate: default_frame_rate(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            default_volume_pct: default_volume_pct(),
            default_tone_pct: default_tone_pct(),
            sim_track_secs: default_sim_track_secs(),
        }
    }
}

fn default_stations_path() -> PathBuf {
    config_dir().join("stations.json")
}

fn default_eq_bar_count() -> usize {
    20
}

fn default_scope_width() -> u32 {
    320
}

fn default_scope_height() -> u32 {
    120
}

fn default_frame_rate() -> u32 {
    30
}

fn default_volume_pct() -> u8 {
    70
}

fn default_tone_pct() -> u8 {
    60
}

fn default_sim_track_secs() -> u64 {
    30
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wradio")
}

pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wradio")
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        config_dir().join("config.toml")
    }
}
