//! # headunit-services
//!
//! Channel service engine for a phone-projection car head unit.
//!
//! Once the transport to the phone is up, every capability the head unit
//! offers (navigation status, media metadata, sensors, input, video, audio and
//! bluetooth) runs as an independent channel state machine on the shared
//! tokio runtime. The registry advertises their capabilities during service
//! discovery and lets the surrounding application steer them.
//!
//! # Architecture
//!
//! ```text
//! headunit-services
//!   ├─> ServiceRegistry (builds one ServiceList per session)
//!   │     ├─> Channel<NavigationStatusService>
//!   │     ├─> Channel<MediaStatusService>
//!   │     ├─> Channel<SensorService>
//!   │     ├─> Channel<InputService>      ──> InputDevice
//!   │     ├─> Channel<VideoService>      ──> VideoOutput
//!   │     ├─> Channel<AudioService> x3   ──> AudioOutput
//!   │     └─> Channel<BluetoothService>  ──> BluetoothDevice
//!   ├─> Messenger (framed transport, external)
//!   └─> StatusListener (UI/state layer, external, rebindable)
//! ```
//!
//! # Data Flow
//!
//! **Inbound:** Messenger → channel lane → service handler → StatusListener / platform
//!
//! **Outbound:** Registry control call → lane command → service handler → Messenger

#![warn(clippy::all)]

/// Channel state machine and serialized lanes
pub mod channel;

/// Configuration
pub mod config;

/// Status listener interface
pub mod listener;

/// Transport collaborator
pub mod messenger;

/// Platform collaborators (video, audio, input, display, bluetooth)
pub mod platform;

/// Typed protocol messages
pub mod protocol;

/// Concrete services and the service registry
pub mod services;

/// Utility functions
pub mod utils;

pub use channel::{ChannelError, ChannelState};
pub use config::Config;
pub use listener::StatusListener;
pub use messenger::{LoopbackMessenger, Messenger, TransportError};
pub use services::{ServiceList, ServiceRegistry};
