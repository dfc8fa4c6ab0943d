//! Status Listener
//!
//! The head-unit UI registers a [`StatusListener`] to be told about navigation
//! guidance, media playback and a handful of session events. Every service of
//! a session shares one [`ListenerSlot`], so rebinding the listener is a single
//! serialized operation that all channels observe on their next notification.
//!
//! Notifications are best-effort: when no listener is bound, they are dropped.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

use crate::protocol::av::VideoFocusMode;
use crate::protocol::bluetooth::BluetoothPairingRequest;
use crate::protocol::input::BindingRequest;
use crate::protocol::media::{MediaMetadata, MediaPlaybackStatus};
use crate::protocol::navigation::{NavigationDistanceEvent, NavigationStatus, NavigationTurnEvent};
use crate::protocol::sensor::SensorStartRequest;

/// Receives decoded status updates from the phone
///
/// All methods default to doing nothing so a UI only implements what it shows.
/// Callbacks run on the channel's lane and should return quickly.
#[cfg_attr(test, mockall::automock)]
pub trait StatusListener: Send + Sync {
    /// Navigation guidance state changed
    fn navigation_status_update(&self, _status: &NavigationStatus) {}

    /// Next maneuver changed
    fn navigation_turn_event(&self, _event: &NavigationTurnEvent) {}

    /// Distance to the next maneuver changed
    fn navigation_distance_event(&self, _event: &NavigationDistanceEvent) {}

    /// Playback state or progress changed
    fn media_playback_update(&self, _status: &MediaPlaybackStatus) {}

    /// Track metadata changed
    fn media_metadata_update(&self, _metadata: &MediaMetadata) {}

    /// Phone asked for a sensor feed
    fn sensor_start_requested(&self, _request: &SensorStartRequest) {}

    /// Phone asked to bind input scan codes
    fn input_binding_requested(&self, _request: &BindingRequest) {}

    /// Projection focus changed
    fn video_focus_changed(&self, _mode: VideoFocusMode) {}

    /// Phone asked to pair over bluetooth
    fn bluetooth_pairing_requested(&self, _request: &BluetoothPairingRequest) {}
}

/// Shared, rebindable reference to the session's [`StatusListener`]
#[derive(Clone, Default)]
pub struct ListenerSlot {
    inner: Arc<RwLock<Option<Arc<dyn StatusListener>>>>,
}

impl ListenerSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the bound listener, returning the previous one
    pub fn bind(&self, listener: Option<Arc<dyn StatusListener>>) -> Option<Arc<dyn StatusListener>> {
        std::mem::replace(&mut *self.inner.write(), listener)
    }

    /// Currently bound listener, if any
    pub fn current(&self) -> Option<Arc<dyn StatusListener>> {
        self.inner.read().clone()
    }

    /// Whether a listener is bound
    pub fn is_bound(&self) -> bool {
        self.inner.read().is_some()
    }
}

impl fmt::Debug for ListenerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSlot")
            .field("bound", &self.is_bound())
            .finish()
    }
}
