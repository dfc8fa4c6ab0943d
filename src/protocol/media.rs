//! Media status messages
//!
//! Now-playing information pushed by the phone for display on the head unit.

use bytes::Bytes;

use super::lift;

/// Playback state of the phone's media session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

impl PlaybackState {
    /// Protocol name of the state
    pub fn name(self) -> &'static str {
        match self {
            Self::Stopped => "STOPPED",
            Self::Playing => "PLAYING",
            Self::Paused => "PAUSED",
        }
    }
}

/// Playback progress update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPlaybackStatus {
    pub state: PlaybackState,
    /// Application supplying the media (e.g. "Spotify")
    pub media_source: String,
    pub track_progress_seconds: u32,
    pub shuffle: bool,
    pub repeat: bool,
    pub repeat_one: bool,
}

/// Track metadata update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaMetadata {
    pub track_name: String,
    pub artist_name: String,
    pub album_name: String,
    /// Encoded album art image, empty when the phone sends none
    pub album_art: Bytes,
    pub track_length_seconds: u32,
}

/// Inbound media status vocabulary
#[derive(Debug, Clone, PartialEq)]
pub enum MediaStatusMessage {
    Playback(MediaPlaybackStatus),
    Metadata(MediaMetadata),
}

impl MediaStatusMessage {
    /// Message name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Playback(_) => "MediaPlaybackStatus",
            Self::Metadata(_) => "MediaMetadata",
        }
    }
}

lift!(InboundMessage::MediaStatus(MediaStatusMessage::Playback(MediaPlaybackStatus)));
lift!(InboundMessage::MediaStatus(MediaStatusMessage::Metadata(MediaMetadata)));
