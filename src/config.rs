//! Configuration loading from deskpet.toml

use deskpet_ui::{InteractionLimits, Point, Size, WindowConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Root configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub window: WindowSection,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Overlay window configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WindowSection {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_true")]
    pub always_on_top: bool,
    #[serde(default)]
    pub click_through: bool,
    /// Let clicks reach the desktop where nothing is drawn (macOS)
    #[serde(default)]
    pub pass_through_empty: bool,
    #[serde(default = "default_fps")]
    pub fps: f32,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            title: default_title(),
            always_on_top: true,
            click_through: false,
            pass_through_empty: false,
            fps: default_fps(),
        }
    }
}

fn default_title() -> String {
    "Animated Desktop".to_string()
}

fn default_true() -> bool {
    true
}

fn default_fps() -> f32 {
    30.0
}

/// Widget placement and interaction limits
#[derive(Debug, Clone, Deserialize)]
pub struct OverlayConfig {
    /// Radius around the top-right corner that starts a resize
    #[serde(default = "default_resize_margin")]
    pub resize_margin: f64,
    #[serde(default = "default_min_size")]
    pub min_size: i32,
    #[serde(default = "default_max_size")]
    pub max_size: i32,
    /// Where newly added widgets appear [x, y]
    #[serde(default = "default_spawn_position")]
    pub spawn_position: [i32; 2],
    /// Still images are scaled to fit inside this square
    #[serde(default = "default_image_max_size")]
    pub image_max_size: u32,
    #[serde(default = "default_video_size")]
    pub video_size: [u32; 2],
    /// Image placed on the overlay at startup
    pub startup_image: Option<PathBuf>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            resize_margin: default_resize_margin(),
            min_size: default_min_size(),
            max_size: default_max_size(),
            spawn_position: default_spawn_position(),
            image_max_size: default_image_max_size(),
            video_size: default_video_size(),
            startup_image: None,
        }
    }
}

fn default_resize_margin() -> f64 {
    deskpet_ui::interaction::DEFAULT_RESIZE_MARGIN
}
fn default_min_size() -> i32 {
    deskpet_ui::interaction::DEFAULT_MIN_SIZE
}
fn default_max_size() -> i32 {
    deskpet_ui::interaction::DEFAULT_MAX_SIZE
}
fn default_spawn_position() -> [i32; 2] {
    [100, 100]
}
fn default_image_max_size() -> u32 {
    600
}
fn default_video_size() -> [u32; 2] {
    [320, 240]
}

impl OverlayConfig {
    pub fn limits(&self) -> InteractionLimits {
        InteractionLimits {
            resize_margin: self.resize_margin,
            min_size: self.min_size,
            max_size: self.max_size.max(self.min_size),
        }
    }

    pub fn spawn_point(&self) -> Point {
        Point::new(self.spawn_position[0], self.spawn_position[1])
    }

    pub fn video_size(&self) -> Size {
        Size::new(self.video_size[0] as i32, self.video_size[1] as i32)
    }
}

/// Asset library configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryConfig {
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: u32,
    /// Default side of a GIF preview window
    #[serde(default = "default_preview_size")]
    pub preview_size: u32,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            assets_dir: default_assets_dir(),
            thumbnail_size: default_thumbnail_size(),
            preview_size: default_preview_size(),
        }
    }
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}
fn default_thumbnail_size() -> u32 {
    100
}
fn default_preview_size() -> u32 {
    300
}

/// Remote GIF fetching
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// GIFs fetched once at startup
    #[serde(default)]
    pub startup: Vec<RemoteGif>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            startup: Vec::new(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteGif {
    pub url: String,
    #[serde(default = "default_spawn_position")]
    pub position: [i32; 2],
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let config = Self::load(path)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn window_config(&self) -> WindowConfig {
        WindowConfig {
            size: None,
            always_on_top: self.window.always_on_top,
            click_through: self.window.click_through,
            pass_through_empty: self.window.pass_through_empty,
            title: self.window.title.clone(),
            target_fps: self.window.fps,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}
