//! Transport Messenger Contract
//!
//! The framing, encryption and decoding layer is an external collaborator.
//! Channels depend only on the [`Messenger`] trait defined here: a per-channel
//! `receive` that resolves with the next decoded message, and a `send` whose
//! completion reports whether the transport accepted the message.
//!
//! # Architecture
//!
//! ```text
//! Phone ──bytes──> [ framing / TLS / decode ] ──InboundMessage──> Messenger::receive(channel)
//!                                                                        │
//!                                                                  channel lane
//!                                                                        │
//! Phone <──bytes── [ encode / TLS / framing ] <──OutboundMessage── Messenger::send(channel, ..)
//! ```
//!
//! [`LoopbackMessenger`] is an in-memory implementation used by the
//! `simulate` command and by the test-suite.

mod loopback;

pub use loopback::{LoopbackMessenger, SentMessage};

use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::{ChannelId, InboundMessage, OutboundMessage};

/// Transport-level failures surfaced to channels
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport has been torn down; no further messages will arrive
    #[error("transport closed")]
    Closed,

    /// Writing a message failed
    #[error("send failed: {0}")]
    Send(String),

    /// Reading or decoding a message failed
    #[error("receive failed: {0}")]
    Receive(String),
}

/// Shared, serialized transport used by every channel of a session
///
/// Implementations must tolerate concurrent calls for *different* channels.
/// A channel never issues two concurrent sends, nor two concurrent receives.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Wait for the next message addressed to `channel`
    async fn receive(&self, channel: ChannelId) -> Result<InboundMessage, TransportError>;

    /// Transmit `message` on `channel`, resolving once the transport is done with it
    async fn send(&self, channel: ChannelId, message: OutboundMessage)
        -> Result<(), TransportError>;
}
