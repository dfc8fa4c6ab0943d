//! Channel Error Types

use std::time::Duration;
use thiserror::Error;

use crate::messenger::TransportError;
use crate::platform::PlatformError;
use crate::protocol::ChannelId;

/// Result type for channel operations
pub type Result<T> = std::result::Result<T, ChannelError>;

/// Channel module error types
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Transport rejected or failed an operation
    #[error("Transport error on {channel}: {source}")]
    Transport {
        /// Channel the operation was issued on
        channel: ChannelId,
        /// Underlying transport failure
        #[source]
        source: TransportError,
    },

    /// Send did not complete within the configured bound
    #[error("Send on {channel} timed out after {timeout:?}")]
    SendTimeout {
        /// Channel the send was issued on
        channel: ChannelId,
        /// Configured bound
        timeout: Duration,
    },

    /// `start` called on a channel that is already running
    #[error("Channel {0} already started")]
    AlreadyStarted(ChannelId),

    /// `start` called on a channel that has been stopped
    #[error("Channel {0} has been stopped")]
    Stopped(ChannelId),

    /// Two services claimed the same channel id
    #[error("Duplicate channel {0} in service list")]
    DuplicateChannel(ChannelId),

    /// Message outside the channel's vocabulary
    #[error("Unexpected {kind} on {channel}")]
    UnexpectedMessage {
        /// Channel the message arrived on
        channel: ChannelId,
        /// Message name
        kind: &'static str,
    },

    /// Platform collaborator failed
    #[error("{collaborator} failed: {source}")]
    Platform {
        /// Collaborator name
        collaborator: &'static str,
        /// Underlying platform failure
        #[source]
        source: PlatformError,
    },
}

impl ChannelError {
    /// Whether the error only concerns a single foreign message
    pub fn is_unexpected_message(&self) -> bool {
        matches!(self, Self::UnexpectedMessage { .. })
    }
}
