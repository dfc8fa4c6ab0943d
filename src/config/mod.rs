//! Configuration management
//!
//! Handles loading, validation, and merging of configuration from:
//! - TOML files
//! - CLI arguments

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::protocol::av::VideoFps;

pub mod types;

pub use types::*;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Vehicle identity
    pub head_unit: HeadUnitConfig,
    /// Session defaults
    pub session: SessionConfig,
    /// Channel lane tunables
    pub channel: ChannelConfig,
    /// Navigation status channel
    pub navigation: NavigationConfig,
    /// Media status channel
    pub media_status: MediaStatusConfig,
    /// Projection video channel
    pub video: VideoSettings,
    /// Audio output channels
    pub audio: AudioSettings,
    /// Input channel
    pub input: InputConfig,
    /// Sensor channel
    pub sensor: SensorConfig,
    /// Bluetooth channel
    pub bluetooth: BluetoothConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Create default configuration
    pub fn default_config() -> Result<Self> {
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.head_unit.name.trim().is_empty() {
            anyhow::bail!("Head unit name must not be empty");
        }

        let area = self.session.display_area;
        if area.width == 0 || area.height == 0 {
            anyhow::bail!("Display area must not be empty: {}", area);
        }

        if self.channel.command_queue_depth == 0 {
            anyhow::bail!("channel.command_queue_depth must be at least 1");
        }

        let nav = &self.navigation;
        if nav.minimum_interval_ms == 0 {
            anyhow::bail!("navigation.minimum_interval_ms must be positive");
        }
        match nav.colour_depth_bits {
            8 | 16 | 24 | 32 => {}
            other => anyhow::bail!("Unsupported navigation colour depth: {} bits", other),
        }
        if nav.image_width == 0 || nav.image_height == 0 {
            anyhow::bail!(
                "Navigation image must not be empty: {}x{}",
                nav.image_width,
                nav.image_height
            );
        }

        if VideoFps::from_rate(self.video.fps).is_none() {
            anyhow::bail!("Invalid video frame rate: {} (expected 30 or 60)", self.video.fps);
        }
        if self.video.dpi == 0 {
            anyhow::bail!("video.dpi must be positive");
        }
        let (width, height) = self.video.resolution.dimensions();
        if self.video.margin_width >= width || self.video.margin_height >= height {
            anyhow::bail!(
                "Video margins {}x{} exceed the {}x{} resolution",
                self.video.margin_width,
                self.video.margin_height,
                width,
                height
            );
        }

        if !self.input.touchscreen && self.input.buttons.is_empty() {
            anyhow::bail!("Input channel needs a touchscreen or at least one button");
        }

        if let Some(address) = &self.bluetooth.adapter_address {
            if !is_bluetooth_address(address) {
                anyhow::bail!("Invalid bluetooth adapter address: {}", address);
            }
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" | "json" => {}
            other => anyhow::bail!("Invalid log format: {}", other),
        }

        Ok(())
    }

    /// Override config with CLI arguments
    pub fn with_overrides(mut self, night_mode: bool, bluetooth_adapter: Option<String>) -> Self {
        if night_mode {
            self.session.night_mode = true;
        }
        if let Some(address) = bluetooth_adapter {
            self.bluetooth.adapter_address = Some(address);
        }
        self
    }
}

fn is_bluetooth_address(address: &str) -> bool {
    let octets: Vec<&str> = address.split(':').collect();
    octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()))
}
