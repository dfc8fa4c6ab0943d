//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::channel::ChannelSettings;
use crate::platform::DisplayRect;
use crate::protocol::av::{VideoConfig, VideoFps, VideoResolution};
use crate::protocol::input::ButtonCode;

/// Vehicle identity reported during service discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadUnitConfig {
    /// Head unit name shown on the phone
    pub name: String,

    /// Car model
    pub car_model: String,

    /// Car model year
    pub car_year: String,

    /// Steering wheel on the left
    pub left_hand_drive: bool,
}

impl Default for HeadUnitConfig {
    fn default() -> Self {
        Self {
            name: "headunit".to_string(),
            car_model: "Universal".to_string(),
            car_year: "2018".to_string(),
            left_hand_drive: true,
        }
    }
}

/// Session defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Start sessions in night mode
    pub night_mode: bool,

    /// Screen area the projection is drawn in
    pub display_area: DisplayRect,
}

/// Channel lane tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Capacity of each lane's command queue
    pub command_queue_depth: usize,

    /// Upper bound on a single send in milliseconds (0 = wait for the transport)
    pub send_timeout_ms: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            command_queue_depth: 32,
            send_timeout_ms: 0,
        }
    }
}

impl ChannelConfig {
    /// Lane settings derived from this section
    pub fn settings(&self) -> ChannelSettings {
        ChannelSettings {
            command_queue_depth: self.command_queue_depth,
            send_timeout: (self.send_timeout_ms > 0)
                .then(|| Duration::from_millis(self.send_timeout_ms)),
        }
    }
}

/// Navigation status channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Advertise the navigation status channel
    pub enabled: bool,

    /// Minimum interval between guidance updates
    pub minimum_interval_ms: u32,

    /// Turn image colour depth (8, 16, 24 or 32)
    pub colour_depth_bits: u8,

    /// Turn image width in pixels
    pub image_width: u16,

    /// Turn image height in pixels
    pub image_height: u16,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            minimum_interval_ms: 1000,
            colour_depth_bits: 16,
            image_width: 256,
            image_height: 256,
        }
    }
}

/// Media status channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaStatusConfig {
    /// Advertise the media status channel
    pub enabled: bool,
}

impl Default for MediaStatusConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Projection video channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    /// Resolution requested from the phone ("480p", "720p", "1080p")
    pub resolution: VideoResolution,

    /// Frames per second (30 or 60)
    pub fps: u32,

    /// Screen density
    pub dpi: u32,

    /// Horizontal margin cropped by the head unit
    pub margin_width: u32,

    /// Vertical margin cropped by the head unit
    pub margin_height: u32,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            resolution: VideoResolution::R480p,
            fps: 30,
            dpi: 140,
            margin_width: 0,
            margin_height: 0,
        }
    }
}

impl VideoSettings {
    /// Protocol video configuration
    ///
    /// Unsupported frame rates fall back to 30; `validate` rejects them first.
    pub fn video_config(&self) -> VideoConfig {
        VideoConfig {
            resolution: self.resolution,
            frame_rate: VideoFps::from_rate(self.fps).unwrap_or(VideoFps::Fps30),
            margin_width: self.margin_width,
            margin_height: self.margin_height,
            dpi: self.dpi,
        }
    }
}

/// Audio output channels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Advertise the media audio channel
    pub media_channel: bool,

    /// Advertise the speech audio channel
    pub speech_channel: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            media_channel: true,
            speech_channel: true,
        }
    }
}

/// Input channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Advertise touchscreen input
    pub touchscreen: bool,

    /// Hard keys the phone may bind
    pub buttons: Vec<ButtonCode>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            touchscreen: true,
            buttons: vec![
                ButtonCode::Enter,
                ButtonCode::Left,
                ButtonCode::Right,
                ButtonCode::Up,
                ButtonCode::Down,
                ButtonCode::Back,
                ButtonCode::Home,
                ButtonCode::Phone,
                ButtonCode::CallEnd,
                ButtonCode::Play,
                ButtonCode::Pause,
                ButtonCode::Previous,
                ButtonCode::Next,
                ButtonCode::TogglePlay,
                ButtonCode::Microphone1,
                ButtonCode::ScrollWheel,
            ],
        }
    }
}

/// Sensor channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Advertise location reports
    pub location: bool,

    /// Re-report night mode every N milliseconds while reporting (0 = only on change)
    pub night_report_interval_ms: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            location: false,
            night_report_interval_ms: 0,
        }
    }
}

impl SensorConfig {
    /// Night re-report period, if enabled
    pub fn night_report_interval(&self) -> Option<Duration> {
        (self.night_report_interval_ms > 0)
            .then(|| Duration::from_millis(self.night_report_interval_ms))
    }
}

/// Bluetooth channel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BluetoothConfig {
    /// Local adapter address; the channel is only advertised when set
    pub adapter_address: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    pub level: String,

    /// Output format ("pretty", "compact", "json")
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
