// Workshop configuration - RON file under the user's config directory

use crate::sequencer::note::MIDI_MAX;
use crate::sequencer::timeline::{GridResolution, Tempo};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = "notegrid";
const CONFIG_FILE_NAME: &str = "config.ron";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No configuration directory on this platform")]
    NoConfigDir,
}

/// Hosted MusicVAE checkpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaeCheckpoints {
    /// 4-bar melody, small quantized (fast to load)
    pub melody: String,
    /// Melody, bass and drums
    pub trio: String,
    /// Drum grooves
    pub groovae: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RnnCheckpoints {
    pub basic: String,
    pub melody: String,
}

/// Where the model services fetch their weights from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoints {
    pub musicvae: VaeCheckpoints,
    pub musicrnn: RnnCheckpoints,
    /// Bach chorales harmonizer
    pub coconet: String,
}

impl Default for Checkpoints {
    fn default() -> Self {
        const BASE: &str = "https://storage.googleapis.com/magentadata/js/checkpoints";
        Self {
            musicvae: VaeCheckpoints {
                melody: format!("{BASE}/music_vae/mel_4bar_small_q2"),
                trio: format!("{BASE}/music_vae/trio_4bar"),
                groovae: format!("{BASE}/music_vae/groovae_4bar"),
            },
            musicrnn: RnnCheckpoints {
                basic: format!("{BASE}/music_rnn/basic_rnn"),
                melody: format!("{BASE}/music_rnn/melody_rnn"),
            },
            coconet: format!("{BASE}/coconet/bach"),
        }
    }
}

/// Workshop-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkshopConfig {
    pub qpm: f64,
    pub steps_per_quarter: u32,
    pub default_velocity: u8,
    /// Written into track files and session manifests
    pub app_name: String,
    /// Undo history depth
    pub undo_limit: usize,
    /// Notifications kept in memory
    pub notification_capacity: usize,
    pub checkpoints: Checkpoints,
}

impl Default for WorkshopConfig {
    fn default() -> Self {
        Self {
            qpm: 90.0,
            steps_per_quarter: 6,
            default_velocity: 96,
            app_name: "notegrid".to_string(),
            undo_limit: 100,
            notification_capacity: 64,
            checkpoints: Checkpoints::default(),
        }
    }
}

impl WorkshopConfig {
    /// `<config dir>/notegrid/config.ron`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = ron::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, falling back to defaults when the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        self.validate()?;
        let path = path.as_ref();
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)?;
        }
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// The tempo and grid must be usable; velocity must be a MIDI velocity
    pub fn validate(&self) -> Result<(), ConfigError> {
        Tempo::new(self.qpm).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        GridResolution::new(self.steps_per_quarter)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.default_velocity == 0 || self.default_velocity > MIDI_MAX {
            return Err(ConfigError::Invalid(format!(
                "Default velocity must be in 1..=127, got {}",
                self.default_velocity
            )));
        }
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::Invalid("App name cannot be empty".to_string()));
        }
        Ok(())
    }
}
