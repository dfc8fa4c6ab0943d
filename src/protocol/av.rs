//! Audio/video stream messages
//!
//! Shared by the video channel and every audio output channel: the phone sets
//! the stream up, starts it, streams media frames that the head unit
//! acknowledges, and finally stops it.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::{lift, Status};

/// Kind of stream an AV channel carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AvStreamType {
    Audio,
    Video,
}

/// Role of an audio output channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioType {
    Speech,
    System,
    Media,
}

impl AudioType {
    /// Protocol name of the audio role
    pub fn name(self) -> &'static str {
        match self {
            Self::Speech => "SPEECH",
            Self::System => "SYSTEM",
            Self::Media => "MEDIA",
        }
    }
}

/// PCM parameters advertised for an audio channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub bit_depth: u32,
    pub channel_count: u32,
}

/// Projection resolutions the phone can render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoResolution {
    #[serde(rename = "480p")]
    R480p,
    #[serde(rename = "720p")]
    R720p,
    #[serde(rename = "1080p")]
    R1080p,
}

impl VideoResolution {
    /// Width and height in pixels
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Self::R480p => (800, 480),
            Self::R720p => (1280, 720),
            Self::R1080p => (1920, 1080),
        }
    }
}

/// Projection frame rates the phone can render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoFps {
    #[serde(rename = "30")]
    Fps30,
    #[serde(rename = "60")]
    Fps60,
}

impl VideoFps {
    /// Map a configured frame rate onto the protocol enumeration
    pub fn from_rate(rate: u32) -> Option<Self> {
        match rate {
            30 => Some(Self::Fps30),
            60 => Some(Self::Fps60),
            _ => None,
        }
    }

    /// Frames per second
    pub fn rate(self) -> u32 {
        match self {
            Self::Fps30 => 30,
            Self::Fps60 => 60,
        }
    }
}

/// Video parameters advertised for the video channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoConfig {
    pub resolution: VideoResolution,
    pub frame_rate: VideoFps,
    pub margin_width: u32,
    pub margin_height: u32,
    pub dpi: u32,
}

/// Phone selects one of the advertised configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvChannelSetupRequest {
    pub config_index: u32,
}

/// Answer to an [`AvChannelSetupRequest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvChannelSetupResponse {
    pub media_status: Status,
    /// Frames the phone may send before waiting for an ack
    pub max_unacked: u32,
    pub configs: Vec<u32>,
}

/// Stream starts with the given session id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvChannelStartIndication {
    pub session: i32,
    pub config: u32,
}

/// Stream stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvChannelStopIndication;

/// One encoded media frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvMediaIndication {
    /// Presentation timestamp in microseconds, absent for codec config frames
    pub timestamp: Option<u64>,
    pub data: Bytes,
}

/// Acknowledges received media frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvMediaAckIndication {
    pub session: i32,
    pub value: u32,
}

/// Who owns the display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoFocusMode {
    /// Projection is shown
    Focused,
    /// Native head-unit UI is shown
    Unfocused,
}

/// Phone asks for a focus change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoFocusRequest {
    pub disp_index: u32,
    pub focus_mode: VideoFocusMode,
}

/// Head unit reports the focus it granted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoFocusIndication {
    pub focus_mode: VideoFocusMode,
    pub unrequested: bool,
}

/// Inbound AV vocabulary
#[derive(Debug, Clone, PartialEq)]
pub enum AvMessage {
    SetupRequest(AvChannelSetupRequest),
    StartIndication(AvChannelStartIndication),
    StopIndication(AvChannelStopIndication),
    Media(AvMediaIndication),
    VideoFocusRequest(VideoFocusRequest),
}

impl AvMessage {
    /// Message name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SetupRequest(_) => "AvChannelSetupRequest",
            Self::StartIndication(_) => "AvChannelStartIndication",
            Self::StopIndication(_) => "AvChannelStopIndication",
            Self::Media(_) => "AvMediaIndication",
            Self::VideoFocusRequest(_) => "VideoFocusRequest",
        }
    }
}

/// Outbound AV vocabulary
#[derive(Debug, Clone, PartialEq)]
pub enum AvOutbound {
    SetupResponse(AvChannelSetupResponse),
    MediaAck(AvMediaAckIndication),
    VideoFocusIndication(VideoFocusIndication),
}

impl AvOutbound {
    /// Message name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SetupResponse(_) => "AvChannelSetupResponse",
            Self::MediaAck(_) => "AvMediaAckIndication",
            Self::VideoFocusIndication(_) => "VideoFocusIndication",
        }
    }
}

lift!(InboundMessage::Av(AvMessage::SetupRequest(AvChannelSetupRequest)));
lift!(InboundMessage::Av(AvMessage::StartIndication(AvChannelStartIndication)));
lift!(InboundMessage::Av(AvMessage::StopIndication(AvChannelStopIndication)));
lift!(InboundMessage::Av(AvMessage::Media(AvMediaIndication)));
lift!(InboundMessage::Av(AvMessage::VideoFocusRequest(VideoFocusRequest)));
lift!(OutboundMessage::Av(AvOutbound::SetupResponse(AvChannelSetupResponse)));
lift!(OutboundMessage::Av(AvOutbound::MediaAck(AvMediaAckIndication)));
lift!(OutboundMessage::Av(AvOutbound::VideoFocusIndication(VideoFocusIndication)));
