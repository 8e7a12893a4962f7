//! Stage configuration loaded from `stage.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collaborators::audio::{DEFAULT_AMBIENT_SOURCE, DEFAULT_AMBIENT_VOLUME};
use crate::interaction::DEFAULT_GRACE_WINDOW;
use crate::world::WorldConfig;
use crate::{BackendType, EngineConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse stage config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSection {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            title: "Rainforest Classroom".into(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorSection {
    /// Title painted on the video placeholder
    pub video_title: String,
    /// Feed the video widget animated colour bars instead of leaving it on its placeholder
    pub test_pattern: bool,
}

impl Default for MirrorSection {
    fn default() -> Self {
        Self {
            video_title: "Rainforest Documentary".into(),
            test_pattern: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionSection {
    /// Seconds pointer events pass through the overlay after the video is clicked
    pub grace_window_secs: f32,
}

impl InteractionSection {
    pub fn grace_window(&self) -> Duration {
        Duration::try_from_secs_f32(self.grace_window_secs).unwrap_or(DEFAULT_GRACE_WINDOW)
    }
}

impl Default for InteractionSection {
    fn default() -> Self {
        Self {
            grace_window_secs: DEFAULT_GRACE_WINDOW.as_secs_f32(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSection {
    /// Token endpoint; `None` leaves the assistant without credentials
    pub token_endpoint: Option<String>,
    pub participant: String,
}

impl Default for VoiceSection {
    fn default() -> Self {
        Self {
            token_endpoint: None,
            participant: "user".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSection {
    pub enabled: bool,
    pub source: String,
    pub volume: f32,
}

impl Default for AudioSection {
    fn default() -> Self {
        Self {
            enabled: true,
            source: DEFAULT_AMBIENT_SOURCE.into(),
            volume: DEFAULT_AMBIENT_VOLUME,
        }
    }
}

/// Everything a host needs to mount the stage; every field has a default
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub window: WindowSection,
    pub world: WorldConfig,
    pub mirror: MirrorSection,
    pub interaction: InteractionSection,
    pub voice: VoiceSection,
    pub audio: AudioSection,
}

impl StageConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        log::info!("Loaded stage config from {}", path.display());
        Ok(config)
    }

    /// Load `path`, falling back to defaults when it is missing or broken
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|err| {
            log::warn!("{err}; using default stage config");
            Self::default()
        })
    }

    /// Renderer-facing settings
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            title: self.window.title.clone(),
            width: self.window.width,
            height: self.window.height,
            backend: BackendType::Wgpu,
            vsync: self.window.vsync,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_source_gives_defaults() {
        let config = StageConfig::from_toml_str("").unwrap();
        assert_eq!(config, StageConfig::default());
        assert_eq!(config.world.trees.count, 50);
        assert_eq!(config.interaction.grace_window(), Duration::from_secs(5));
    }

    #[test]
    fn sections_override_fields() {
        let config = StageConfig::from_toml_str(
            r#"
            [window]
            width = 800

            [world]
            seed = 42
            fog_density = 0.05

            [world.trees]
            count = 5

            [interaction]
            grace_window_secs = 2.5

            [audio]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.world.seed, Some(42));
        assert_eq!(config.world.trees.count, 5);
        assert_relative_eq!(config.world.trees.clearance, 0.0);
        assert_eq!(config.interaction.grace_window(), Duration::from_millis(2500));
        assert!(!config.audio.enabled);
        assert_relative_eq!(config.audio.volume, 0.3);
    }

    #[test]
    fn negative_grace_windows_fall_back() {
        let config = StageConfig::from_toml_str("[interaction]\ngrace_window_secs = -1.0").unwrap();
        assert_eq!(config.interaction.grace_window(), DEFAULT_GRACE_WINDOW);
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        assert!(matches!(
            StageConfig::from_toml_str("[window\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            StageConfig::load(Path::new("/nonexistent/stage.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
