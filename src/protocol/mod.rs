//! Protocol Message Vocabulary
//!
//! Typed messages exchanged between the head unit and the phone once the
//! transport layer has framed, decrypted and decoded them.
//!
//! # Overview
//!
//! The transport collaborator delivers one [`InboundMessage`] at a time to the
//! channel it is addressed to, and accepts [`OutboundMessage`] values for
//! transmission. Every channel shares the open handshake
//! ([`ChannelOpenRequest`] / [`ChannelOpenResponse`]); everything else belongs
//! to the vocabulary of a single capability:
//!
//! ```text
//! Channel          Inbound (phone → head unit)        Outbound (head unit → phone)
//! ━━━━━━━          ━━━━━━━━━━━━━━━━━━━━━━━━━━━        ━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//! Navigation       status / turn / distance           -
//! MediaStatus      playback / metadata                -
//! Sensor           start request                      start response, readings
//! Input            binding request                    binding response, events
//! Video, Audio     setup / start / stop / media       setup response, ack, focus
//! Bluetooth        pairing request                    pairing response
//! ```
//!
//! Capability advertisement lives in [`discovery`].

pub mod av;
pub mod bluetooth;
pub mod discovery;
pub mod input;
pub mod media;
pub mod navigation;
pub mod sensor;

use serde::{Deserialize, Serialize};

pub use av::{AvMessage, AvOutbound};
pub use bluetooth::{BluetoothMessage, BluetoothOutbound};
pub use discovery::{ChannelDescriptor, ChannelPayload, ServiceDiscoveryResponse};
pub use input::{InputMessage, InputOutbound};
pub use media::MediaStatusMessage;
pub use navigation::NavigationMessage;
pub use sensor::{SensorMessage, SensorOutbound};

/// Logical channel identifier, unique within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u32)]
pub enum ChannelId {
    /// Session control (handled by the transport layer)
    Control = 0,
    /// Button, key and touch injection
    Input = 1,
    /// Vehicle sensor readings
    Sensor = 2,
    /// Projected video stream
    Video = 3,
    /// Media audio stream
    MediaAudio = 4,
    /// Voice guidance / assistant audio stream
    SpeechAudio = 5,
    /// System sounds
    SystemAudio = 6,
    /// Microphone input
    AvInput = 7,
    /// Bluetooth pairing negotiation
    Bluetooth = 8,
    /// Turn-by-turn navigation status
    Navigation = 9,
    /// Now-playing metadata
    MediaStatus = 10,
}

impl ChannelId {
    /// Numeric identifier as carried on the wire
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Short lowercase name for logs and span fields
    pub fn name(self) -> &'static str {
        match self {
            Self::Control => "control",
            Self::Input => "input",
            Self::Sensor => "sensor",
            Self::Video => "video",
            Self::MediaAudio => "media-audio",
            Self::SpeechAudio => "speech-audio",
            Self::SystemAudio => "system-audio",
            Self::AvInput => "av-input",
            Self::Bluetooth => "bluetooth",
            Self::Navigation => "navigation",
            Self::MediaStatus => "media-status",
        }
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), self.as_u32())
    }
}

/// Generic request/response status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Request accepted
    Ok,
    /// Request rejected
    Fail,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

/// Phone asks the head unit to open a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelOpenRequest {
    /// Scheduling priority requested by the phone
    pub priority: i32,
    /// Channel the request was issued for
    pub channel_id: u32,
}

/// Head unit's answer to a [`ChannelOpenRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelOpenResponse {
    /// Outcome of the open request
    pub status: Status,
}

/// Decoded message delivered by the transport to one channel
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Open handshake, common to every channel
    ChannelOpenRequest(ChannelOpenRequest),
    /// Navigation status vocabulary
    Navigation(NavigationMessage),
    /// Media status vocabulary
    MediaStatus(MediaStatusMessage),
    /// Sensor vocabulary
    Sensor(SensorMessage),
    /// Input vocabulary
    Input(InputMessage),
    /// Audio/video stream vocabulary
    Av(AvMessage),
    /// Bluetooth vocabulary
    Bluetooth(BluetoothMessage),
}

impl InboundMessage {
    /// Message name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ChannelOpenRequest(_) => "ChannelOpenRequest",
            Self::Navigation(m) => m.kind(),
            Self::MediaStatus(m) => m.kind(),
            Self::Sensor(m) => m.kind(),
            Self::Input(m) => m.kind(),
            Self::Av(m) => m.kind(),
            Self::Bluetooth(m) => m.kind(),
        }
    }
}

/// Message submitted by a channel for transmission to the phone
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// Open handshake answer, common to every channel
    ChannelOpenResponse(ChannelOpenResponse),
    /// Sensor vocabulary
    Sensor(SensorOutbound),
    /// Input vocabulary
    Input(InputOutbound),
    /// Audio/video stream vocabulary
    Av(AvOutbound),
    /// Bluetooth vocabulary
    Bluetooth(BluetoothOutbound),
}

impl OutboundMessage {
    /// Message name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ChannelOpenResponse(_) => "ChannelOpenResponse",
            Self::Sensor(m) => m.kind(),
            Self::Input(m) => m.kind(),
            Self::Av(m) => m.kind(),
            Self::Bluetooth(m) => m.kind(),
        }
    }
}

impl From<ChannelOpenRequest> for InboundMessage {
    fn from(request: ChannelOpenRequest) -> Self {
        Self::ChannelOpenRequest(request)
    }
}

impl From<ChannelOpenResponse> for OutboundMessage {
    fn from(response: ChannelOpenResponse) -> Self {
        Self::ChannelOpenResponse(response)
    }
}

/// Implements `From<$ty>` for a wrapper enum through an intermediate vocabulary enum
macro_rules! lift {
    ($target:ident :: $outer:ident ( $vocab:ident :: $inner:ident ( $ty:ty ) )) => {
        impl From<$ty> for $crate::protocol::$target {
            fn from(value: $ty) -> Self {
                $crate::protocol::$target::$outer($vocab::$inner(value))
            }
        }
    };
}
pub(crate) use lift;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_id_wire_values() {
        assert_eq!(ChannelId::Input.as_u32(), 1);
        assert_eq!(ChannelId::Video.as_u32(), 3);
        assert_eq!(ChannelId::Navigation.as_u32(), 9);
        assert_eq!(ChannelId::MediaStatus.as_u32(), 10);
    }

    #[test]
    fn test_channel_id_display() {
        assert_eq!(ChannelId::Sensor.to_string(), "sensor(2)");
    }

    #[test]
    fn test_message_kind_names() {
        let open = InboundMessage::from(ChannelOpenRequest {
            priority: 5,
            channel_id: ChannelId::Navigation.as_u32(),
        });
        assert_eq!(open.kind(), "ChannelOpenRequest");

        let response = OutboundMessage::from(ChannelOpenResponse { status: Status::Ok });
        assert_eq!(response.kind(), "ChannelOpenResponse");
    }
}
