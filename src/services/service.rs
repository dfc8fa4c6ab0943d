//! Core service types
//!
//! Defines the closed set of services, the common lifecycle they share and the
//! ordered list a session keeps them in.

use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{error, info};

use super::audio::AudioService;
use super::bluetooth::BluetoothService;
use super::input::InputService;
use super::media_status::MediaStatusService;
use super::navigation::NavigationStatusService;
use super::sensor::SensorService;
use super::video::VideoService;
use crate::channel::{Channel, ChannelError, ChannelLifecycle, ChannelState, ChannelStatsSnapshot};
use crate::protocol::{ChannelId, ServiceDiscoveryResponse};

/// Kind of capability a service provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ServiceKind {
    /// Turn-by-turn guidance
    Navigation,
    /// Now-playing metadata
    MediaStatus,
    /// Vehicle sensors
    Sensor,
    /// Keys, rotary and touch
    Input,
    /// Projection video
    Video,
    /// Audio output
    Audio,
    /// Bluetooth pairing
    Bluetooth,
}

impl ServiceKind {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Navigation => "Navigation Status",
            Self::MediaStatus => "Media Status",
            Self::Sensor => "Sensor",
            Self::Input => "Input",
            Self::Video => "Video",
            Self::Audio => "Audio",
            Self::Bluetooth => "Bluetooth",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One service of a session, owning its channel
pub enum Service {
    /// Navigation status channel
    Navigation(Channel<NavigationStatusService>),
    /// Media status channel
    MediaStatus(Channel<MediaStatusService>),
    /// Sensor channel
    Sensor(Channel<SensorService>),
    /// Input channel
    Input(Channel<InputService>),
    /// Projection video channel
    Video(Channel<VideoService>),
    /// One audio output channel
    Audio(Channel<AudioService>),
    /// Bluetooth channel
    Bluetooth(Channel<BluetoothService>),
}

impl Service {
    /// Kind of the service
    pub fn kind(&self) -> ServiceKind {
        match self {
            Self::Navigation(_) => ServiceKind::Navigation,
            Self::MediaStatus(_) => ServiceKind::MediaStatus,
            Self::Sensor(_) => ServiceKind::Sensor,
            Self::Input(_) => ServiceKind::Input,
            Self::Video(_) => ServiceKind::Video,
            Self::Audio(_) => ServiceKind::Audio,
            Self::Bluetooth(_) => ServiceKind::Bluetooth,
        }
    }

    fn channel(&self) -> &dyn ChannelLifecycle {
        match self {
            Self::Navigation(c) => c,
            Self::MediaStatus(c) => c,
            Self::Sensor(c) => c,
            Self::Input(c) => c,
            Self::Video(c) => c,
            Self::Audio(c) => c,
            Self::Bluetooth(c) => c,
        }
    }

    /// Channel owned by the service
    pub fn channel_id(&self) -> ChannelId {
        self.channel().channel_id()
    }

    /// Service name used in logs
    pub fn name(&self) -> &'static str {
        self.channel().name()
    }

    /// Lifecycle state of the service's channel
    pub fn state(&self) -> ChannelState {
        self.channel().state()
    }

    /// Start listening on the channel
    pub fn start(&self) -> Result<(), ChannelError> {
        self.channel().start()
    }

    /// Stop listening on the channel; idempotent
    pub fn stop(&self) {
        self.channel().stop()
    }

    /// Contribute the service's descriptor to the discovery response
    pub fn fill_features(&self, response: &mut ServiceDiscoveryResponse) {
        self.channel().fill_features(response)
    }

    /// Channel counters
    pub fn stats(&self) -> ChannelStatsSnapshot {
        self.channel().stats()
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("kind", &self.kind())
            .field("channel", &self.channel_id())
            .field("state", &self.state())
            .finish()
    }
}

/// Counters of one service, as reported by [`ServiceList::stats`]
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub service: &'static str,
    pub channel: ChannelId,
    pub state: ChannelState,
    #[serde(flatten)]
    pub counters: ChannelStatsSnapshot,
}

/// Ordered services of one session
///
/// Registration order drives start/stop fan-out and advertisement order.
#[derive(Debug, Default)]
pub struct ServiceList {
    services: Vec<Service>,
    channels: HashSet<ChannelId>,
}

impl ServiceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a service, rejecting a second service on the same channel
    pub fn push(&mut self, service: Service) -> Result<(), ChannelError> {
        let channel = service.channel_id();
        if !self.channels.insert(channel) {
            return Err(ChannelError::DuplicateChannel(channel));
        }
        self.services.push(service);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.services.iter()
    }

    /// Service owning `channel`
    pub fn get(&self, channel: ChannelId) -> Option<&Service> {
        self.services.iter().find(|s| s.channel_id() == channel)
    }

    /// Channels in registration order
    pub fn channel_ids(&self) -> Vec<ChannelId> {
        self.services.iter().map(Service::channel_id).collect()
    }

    /// Start every service in registration order
    ///
    /// A service that fails to start does not prevent the others from
    /// starting; the first failure is returned.
    pub fn start_all(&self) -> Result<(), ChannelError> {
        let mut first_error = None;
        for service in &self.services {
            if let Err(e) = service.start() {
                error!("Failed to start {}: {}", service.name(), e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Stop every service in registration order
    pub fn stop_all(&self) {
        for service in &self.services {
            service.stop();
        }
    }

    /// Stop every service and wait for their lanes to finish
    pub async fn shutdown(self) {
        self.stop_all();
        let tasks: Vec<_> = self
            .services
            .iter()
            .filter_map(|s| s.channel().take_task())
            .collect();
        for result in join_all(tasks).await {
            if let Err(e) = result {
                error!("Channel lane ended abnormally: {}", e);
            }
        }
    }

    /// Append every service's descriptor in registration order
    pub fn fill_features(&self, response: &mut ServiceDiscoveryResponse) {
        for service in &self.services {
            service.fill_features(response);
        }
    }

    /// Counters of every service
    pub fn stats(&self) -> Vec<ServiceStats> {
        self.services
            .iter()
            .map(|s| ServiceStats {
                service: s.name(),
                channel: s.channel_id(),
                state: s.state(),
                counters: s.stats(),
            })
            .collect()
    }

    /// Log a summary of the session's services
    pub fn log_summary(&self) {
        info!("╔════════════════════════════════════════════════════════════╗");
        info!("║                   Head Unit Services                       ║");
        info!("╚════════════════════════════════════════════════════════════╝");
        for service in &self.services {
            info!(
                "  {:20} {:18} [{}]",
                service.kind().name(),
                service.channel_id().to_string(),
                service.state()
            );
        }
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }
}

impl<'a> IntoIterator for &'a ServiceList {
    type Item = &'a Service;
    type IntoIter = std::slice::Iter<'a, Service>;

    fn into_iter(self) -> Self::IntoIter {
        self.services.iter()
    }
}
