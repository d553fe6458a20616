//! Configuration module
//!
//! Handles loading and saving camwire configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::frame;
use crate::protocol::{limits::DEFAULT_FPS, CameraStatus, ResolutionTier, StreamPacket};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Camera identity and initial stream settings
    #[serde(default)]
    pub camera: CameraConfig,

    /// Placeholder frame settings
    #[serde(default)]
    pub placeholder: PlaceholderConfig,
}

/// General configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging
    #[serde(default)]
    pub verbose: bool,
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_camera_name")]
    pub name: String,
    #[serde(default = "default_camera_group")]
    pub group: String,
    #[serde(default = "default_fps")]
    pub fps: i32,
    /// Resolution tier index (0 = QCIF ... 6 = 960p, 7 = original size)
    #[serde(default = "default_resolution")]
    pub resolution: i32,
    #[serde(default = "default_true")]
    pub auto_regulate_resolution: bool,
    #[serde(default)]
    pub zoom_supported: bool,
    #[serde(default)]
    pub flashlight_enabled: bool,
}

fn default_camera_name() -> String {
    "Unknown".to_string()
}

fn default_camera_group() -> String {
    "Default".to_string()
}

fn default_fps() -> i32 {
    DEFAULT_FPS
}

fn default_resolution() -> i32 {
    ResolutionTier::Original.index()
}

fn default_true() -> bool {
    true
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            name: default_camera_name(),
            group: default_camera_group(),
            fps: default_fps(),
            resolution: default_resolution(),
            auto_regulate_resolution: default_true(),
            zoom_supported: false,
            flashlight_enabled: false,
        }
    }
}

impl CameraConfig {
    /// Resolution tier, falling back to the original size for unknown indices
    pub fn resolution_tier(&self) -> ResolutionTier {
        ResolutionTier::from_index(self.resolution).unwrap_or_default()
    }

    /// Build the initial stream packet for this camera
    pub fn stream_packet(&self, placeholder: &PlaceholderConfig) -> StreamPacket {
        StreamPacket {
            fps: crate::protocol::clamp_fps(self.fps),
            name: self.name.clone(),
            group: self.group.clone(),
            resolution: self.resolution_tier(),
            auto_regulate_resolution: self.auto_regulate_resolution,
            zoom_supported: self.zoom_supported,
            flashlight_enabled: self.flashlight_enabled,
            status: CameraStatus::OK,
            image: placeholder.render(),
            ..Default::default()
        }
    }
}

/// Placeholder frame configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceholderConfig {
    #[serde(default = "default_placeholder_width")]
    pub width: u32,
    #[serde(default = "default_placeholder_height")]
    pub height: u32,
    #[serde(default = "default_placeholder_text")]
    pub text: String,
}

fn default_placeholder_width() -> u32 {
    640
}

fn default_placeholder_height() -> u32 {
    480
}

fn default_placeholder_text() -> String {
    frame::NO_IMAGE_TEXT.to_string()
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            width: default_placeholder_width(),
            height: default_placeholder_height(),
            text: default_placeholder_text(),
        }
    }
}

impl PlaceholderConfig {
    pub fn render(&self) -> image::RgbImage {
        frame::placeholder(self.width, self.height, &self.text)
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the default location
    pub fn load_default() -> ConfigResult<Self> {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("camwire/config.toml")),
            Some(PathBuf::from("./camwire.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn stream_packet(&self) -> StreamPacket {
        self.camera.stream_packet(&self.placeholder)
    }
}

/// Generate a sample configuration file
pub fn generate_sample_config() -> ConfigResult<String> {
    let config = Config {
        camera: CameraConfig {
            name: "Front Door".to_string(),
            group: "Outdoor".to_string(),
            resolution: ResolutionTier::Cif.index(),
            ..Default::default()
        },
        ..Default::default()
    };

    Ok(toml::to_string_pretty(&config)?)
}
