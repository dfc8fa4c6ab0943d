//! Shared fixtures for the integration tests
#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

use headunit_services::config::Config;
use headunit_services::listener::StatusListener;
use headunit_services::messenger::LoopbackMessenger;
use headunit_services::platform::headless::HeadlessPlatform;
use headunit_services::protocol::av::VideoFocusMode;
use headunit_services::protocol::bluetooth::BluetoothPairingRequest;
use headunit_services::protocol::input::BindingRequest;
use headunit_services::protocol::media::{MediaMetadata, MediaPlaybackStatus, PlaybackState};
use headunit_services::protocol::navigation::{
    NavigationDistanceEvent, NavigationState, NavigationStatus, NavigationTurnEvent,
};
use headunit_services::protocol::sensor::{SensorStartRequest, SensorType};
use headunit_services::protocol::{ChannelId, ChannelOpenRequest, OutboundMessage};
use headunit_services::services::{ServiceList, ServiceRegistry};

pub const STEP: Duration = Duration::from_secs(2);

/// One observed listener call
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    NavigationStatus(NavigationState),
    Turn(String),
    Distance(f64),
    Playback(PlaybackState),
    Metadata(String),
    SensorStart(SensorType),
    Binding(Vec<u32>),
    Focus(VideoFocusMode),
    Pairing(String),
}

/// Listener that records every call
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<Event>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub async fn wait_for(&self, count: usize) -> bool {
        tokio::time::timeout(STEP, async {
            while self.len() < count {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .is_ok()
    }

    fn record(&self, event: Event) {
        self.events.lock().push(event);
    }
}

impl StatusListener for RecordingListener {
    fn navigation_status_update(&self, status: &NavigationStatus) {
        self.record(Event::NavigationStatus(status.status));
    }

    fn navigation_turn_event(&self, event: &NavigationTurnEvent) {
        self.record(Event::Turn(event.street_name.clone()));
    }

    fn navigation_distance_event(&self, event: &NavigationDistanceEvent) {
        self.record(Event::Distance(event.display_distance()));
    }

    fn media_playback_update(&self, status: &MediaPlaybackStatus) {
        self.record(Event::Playback(status.state));
    }

    fn media_metadata_update(&self, metadata: &MediaMetadata) {
        self.record(Event::Metadata(metadata.track_name.clone()));
    }

    fn sensor_start_requested(&self, request: &SensorStartRequest) {
        self.record(Event::SensorStart(request.sensor_type));
    }

    fn input_binding_requested(&self, request: &BindingRequest) {
        self.record(Event::Binding(request.scan_codes.clone()));
    }

    fn video_focus_changed(&self, mode: VideoFocusMode) {
        self.record(Event::Focus(mode));
    }

    fn bluetooth_pairing_requested(&self, request: &BluetoothPairingRequest) {
        self.record(Event::Pairing(request.phone_address.clone()));
    }
}

/// A registry with headless collaborators and one created session
pub struct Session {
    pub registry: ServiceRegistry,
    pub platform: HeadlessPlatform,
    pub messenger: Arc<LoopbackMessenger>,
    pub services: ServiceList,
}

impl Session {
    /// Build the session without starting it; needs a tokio runtime
    pub fn create(config: Config) -> Self {
        let platform = HeadlessPlatform::new(
            config.session.display_area,
            config.bluetooth.adapter_address.as_deref(),
        );
        let registry = ServiceRegistry::new(Handle::current(), Arc::new(config), platform.platform());
        let messenger = Arc::new(LoopbackMessenger::new());
        let services = registry.create(messenger.clone());
        Self {
            registry,
            platform,
            messenger,
            services,
        }
    }

    /// Build and start every service
    pub async fn started(config: Config) -> Self {
        let session = Self::create(config);
        session.services.start_all().expect("start_all");
        for channel in session.services.channel_ids() {
            assert!(
                session.armed(channel).await,
                "{} never armed its receive",
                channel
            );
        }
        session
    }

    /// Wait until exactly one receive is outstanding on `channel`
    pub async fn armed(&self, channel: ChannelId) -> bool {
        self.messenger
            .wait_for_pending_receives(channel, 1, STEP)
            .await
    }

    /// Run the open handshake on `channel`
    pub async fn open(&self, channel: ChannelId, priority: i32) {
        let before = self.messenger.sent_on(channel).len();
        self.messenger.deliver(
            channel,
            ChannelOpenRequest {
                priority,
                channel_id: channel.as_u32(),
            },
        );
        assert!(
            self.messenger.wait_for_sent(channel, before + 1, STEP).await,
            "{} did not answer the open request",
            channel
        );
    }

    pub fn sent_on(&self, channel: ChannelId) -> Vec<OutboundMessage> {
        self.messenger.sent_on(channel)
    }
}
