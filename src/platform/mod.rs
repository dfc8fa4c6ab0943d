//! Platform Collaborators
//!
//! Services never touch pixels, PCM samples or pairing state. They talk to the
//! head unit's hardware through the narrow traits in this module:
//!
//! - [`VideoOutput`]: hardware decode and display of the projection stream
//! - [`AudioOutput`]: PCM sink, one per audio channel
//! - [`InputDevice`]: touchscreen and hard keys
//! - [`DisplaySurface`]: geometry of the area the projection is drawn in
//! - [`BluetoothDevice`]: local adapter and pairing lookup
//!
//! The [`headless`] implementations log what they receive and are used by the
//! `simulate` command and the test-suite.

pub mod headless;
mod input;

pub use input::{ButtonEventType, DeviceEvent, InputSink, Key, KeyEvent, WheelDirection};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failures reported by platform collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// Device could not be opened
    #[error("{0} unavailable")]
    Unavailable(&'static str),

    /// Device rejected an operation
    #[error("{device}: {reason}")]
    Device {
        /// Device name
        device: &'static str,
        /// Failure description
        reason: String,
    },
}

/// Rectangle on the head unit's screen, in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl DisplayRect {
    /// Rectangle at `(x, y)` of the given size
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the point lies inside the rectangle
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let right = i64::from(self.x) + i64::from(self.width);
        let bottom = i64::from(self.y) + i64::from(self.height);
        x >= self.x && y >= self.y && i64::from(x) < right && i64::from(y) < bottom
    }
}

impl Default for DisplayRect {
    fn default() -> Self {
        Self::new(0, 0, 800, 480)
    }
}

impl fmt::Display for DisplayRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Hardware video pipeline
pub trait VideoOutput: Send + Sync {
    /// Acquire the decoder
    fn open(&self) -> Result<(), PlatformError>;
    /// Prepare the decoder for a new stream
    fn init(&self) -> Result<(), PlatformError>;
    /// Queue one encoded frame
    fn write(&self, timestamp: Option<u64>, frame: &Bytes);
    /// Release the decoder
    fn stop(&self);
    /// Blend the projection with the native UI, 0 transparent to 255 opaque
    fn set_opacity(&self, alpha: u8);
    /// Move the projection to a new screen area
    fn resize(&self, area: DisplayRect);
}

/// PCM audio sink
pub trait AudioOutput: Send + Sync {
    /// Acquire the sink
    fn open(&self) -> Result<(), PlatformError>;
    /// Begin playback
    fn start(&self);
    /// Queue one PCM frame
    fn write(&self, timestamp: Option<u64>, frame: &Bytes);
    /// Pause playback, keeping the sink
    fn suspend(&self);
    /// Release the sink
    fn stop(&self);
}

/// Touchscreen and hard keys
pub trait InputDevice: Send + Sync {
    /// Begin delivering events into `sink`
    fn start(&self, sink: InputSink);
    /// Stop delivering events
    fn stop(&self);
}

/// Screen area the projection is drawn in
pub trait DisplaySurface: Send + Sync {
    /// Current geometry of the projection area
    fn active_area(&self) -> DisplayRect;
}

/// Local bluetooth adapter
pub trait BluetoothDevice: Send + Sync {
    /// Whether the adapter is powered and usable
    fn is_available(&self) -> bool;
    /// Local adapter address
    fn adapter_address(&self) -> String;
    /// Whether `address` is already paired with the adapter
    fn is_paired(&self, address: &str) -> bool;
}

/// Collaborators lent to one session's services
#[derive(Clone)]
pub struct Platform {
    pub video: Arc<dyn VideoOutput>,
    pub media_audio: Arc<dyn AudioOutput>,
    pub speech_audio: Arc<dyn AudioOutput>,
    pub system_audio: Arc<dyn AudioOutput>,
    pub input: Arc<dyn InputDevice>,
    pub display: Arc<dyn DisplaySurface>,
    pub bluetooth: Option<Arc<dyn BluetoothDevice>>,
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("display", &self.display.active_area())
            .field("bluetooth", &self.bluetooth.is_some())
            .finish_non_exhaustive()
    }
}
