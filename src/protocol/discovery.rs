//! Service discovery descriptors
//!
//! During session negotiation the phone asks what the head unit can do. Every
//! registered service contributes exactly one [`ChannelDescriptor`] to the
//! [`ServiceDiscoveryResponse`].

use serde::{Deserialize, Serialize};

use super::av::{AudioConfig, AudioType, AvStreamType, VideoConfig};
use super::bluetooth::BluetoothPairingMethod;
use super::navigation::NavigationTurnType;
use super::sensor::SensorType;
use super::ChannelId;

/// Image parameters for turn-by-turn guidance images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationImageOptions {
    pub colour_depth_bits: u8,
    pub width: u16,
    pub height: u16,
    /// Undocumented field, always 255
    pub dunno: u8,
}

/// Navigation channel capabilities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationChannel {
    pub minimum_interval_ms: u32,
    pub guidance_type: NavigationTurnType,
    pub image_options: NavigationImageOptions,
}

/// Sensor channel capabilities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorChannel {
    pub sensors: Vec<SensorType>,
}

/// Touchscreen geometry in video coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchScreenConfig {
    pub width: u32,
    pub height: u32,
}

/// Input channel capabilities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputChannel {
    pub supported_keycodes: Vec<u32>,
    pub touch_screen_config: Option<TouchScreenConfig>,
}

/// Audio or video output channel capabilities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvChannel {
    pub stream_type: AvStreamType,
    pub audio_type: Option<AudioType>,
    pub available_while_in_call: bool,
    pub audio_configs: Vec<AudioConfig>,
    pub video_configs: Vec<VideoConfig>,
}

/// Bluetooth channel capabilities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BluetoothChannel {
    pub adapter_address: String,
    pub supported_pairing_methods: Vec<BluetoothPairingMethod>,
}

/// Capability-specific part of a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelPayload {
    Navigation(NavigationChannel),
    MediaInfo,
    Sensor(SensorChannel),
    Input(InputChannel),
    Av(AvChannel),
    Bluetooth(BluetoothChannel),
}

/// One advertised channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDescriptor {
    pub channel_id: u32,
    pub payload: ChannelPayload,
}

impl ChannelDescriptor {
    /// Descriptor for `channel` with the given payload
    pub fn new(channel: ChannelId, payload: ChannelPayload) -> Self {
        Self {
            channel_id: channel.as_u32(),
            payload,
        }
    }
}

/// Answer to the phone's service discovery request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDiscoveryResponse {
    pub head_unit_name: String,
    pub car_model: String,
    pub car_year: String,
    pub left_hand_drive_vehicle: bool,
    pub channels: Vec<ChannelDescriptor>,
}

impl ServiceDiscoveryResponse {
    /// Append one channel descriptor
    pub fn add_channel(&mut self, descriptor: ChannelDescriptor) {
        self.channels.push(descriptor);
    }

    /// Channel ids in advertisement order
    pub fn channel_ids(&self) -> Vec<u32> {
        self.channels.iter().map(|c| c.channel_id).collect()
    }

    /// Descriptor advertised for `channel`, if any
    pub fn channel(&self, channel: ChannelId) -> Option<&ChannelDescriptor> {
        self.channels
            .iter()
            .find(|c| c.channel_id == channel.as_u32())
    }
}
