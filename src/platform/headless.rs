//! Headless collaborators
//!
//! Stand-ins for the head unit's hardware that log what they are asked to do
//! and keep enough state to be inspected afterwards.

use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace};

use super::{
    AudioOutput, BluetoothDevice, DeviceEvent, DisplayRect, DisplaySurface, InputDevice,
    InputSink, Platform, PlatformError, VideoOutput,
};

#[derive(Debug, Default)]
struct VideoState {
    open: bool,
    frames: u64,
    bytes: u64,
    opacity: Option<u8>,
    area: Option<DisplayRect>,
}

/// Video output that counts frames instead of decoding them
#[derive(Debug, Default)]
pub struct HeadlessVideoOutput {
    state: Mutex<VideoState>,
    refuse_open: AtomicBool,
}

impl HeadlessVideoOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `open` fail
    pub fn refuse_open(&self, refuse: bool) {
        self.refuse_open.store(refuse, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    pub fn frames(&self) -> u64 {
        self.state.lock().frames
    }

    pub fn opacity(&self) -> Option<u8> {
        self.state.lock().opacity
    }

    pub fn area(&self) -> Option<DisplayRect> {
        self.state.lock().area
    }
}

impl VideoOutput for HeadlessVideoOutput {
    fn open(&self) -> Result<(), PlatformError> {
        if self.refuse_open.load(Ordering::SeqCst) {
            return Err(PlatformError::Unavailable("video decoder"));
        }
        self.state.lock().open = true;
        info!("headless video output opened");
        Ok(())
    }

    fn init(&self) -> Result<(), PlatformError> {
        debug!("headless video output initialized");
        Ok(())
    }

    fn write(&self, timestamp: Option<u64>, frame: &Bytes) {
        let mut state = self.state.lock();
        state.frames += 1;
        state.bytes += frame.len() as u64;
        trace!(?timestamp, len = frame.len(), "video frame");
    }

    fn stop(&self) {
        let mut state = self.state.lock();
        if state.open {
            info!(
                "headless video output stopped after {} frames ({} bytes)",
                state.frames, state.bytes
            );
        }
        state.open = false;
    }

    fn set_opacity(&self, alpha: u8) {
        debug!("video opacity: {}", alpha);
        self.state.lock().opacity = Some(alpha);
    }

    fn resize(&self, area: DisplayRect) {
        debug!("video area: {}", area);
        self.state.lock().area = Some(area);
    }
}

#[derive(Debug, Default)]
struct AudioState {
    open: bool,
    playing: bool,
    frames: u64,
}

/// Audio sink that counts PCM frames
#[derive(Debug)]
pub struct HeadlessAudioOutput {
    name: &'static str,
    state: Mutex<AudioState>,
}

impl HeadlessAudioOutput {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(AudioState::default()),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    pub fn frames(&self) -> u64 {
        self.state.lock().frames
    }
}

impl AudioOutput for HeadlessAudioOutput {
    fn open(&self) -> Result<(), PlatformError> {
        self.state.lock().open = true;
        debug!("{} audio output opened", self.name);
        Ok(())
    }

    fn start(&self) {
        self.state.lock().playing = true;
        debug!("{} audio output playing", self.name);
    }

    fn write(&self, timestamp: Option<u64>, frame: &Bytes) {
        self.state.lock().frames += 1;
        trace!(?timestamp, len = frame.len(), "{} audio frame", self.name);
    }

    fn suspend(&self) {
        self.state.lock().playing = false;
        debug!("{} audio output suspended", self.name);
    }

    fn stop(&self) {
        let mut state = self.state.lock();
        state.playing = false;
        state.open = false;
        debug!("{} audio output stopped", self.name);
    }
}

/// Input device driven by [`HeadlessInputDevice::inject`]
#[derive(Debug, Default)]
pub struct HeadlessInputDevice {
    sink: Mutex<Option<InputSink>>,
}

impl HeadlessInputDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_started(&self) -> bool {
        self.sink.lock().is_some()
    }

    /// Feed an event as if the hardware produced it
    pub fn inject(&self, event: DeviceEvent) -> bool {
        let sink = self.sink.lock().clone();
        match sink {
            Some(sink) => sink.deliver(event),
            None => {
                debug!("input device not started, dropping {:?}", event);
                false
            }
        }
    }
}

impl InputDevice for HeadlessInputDevice {
    fn start(&self, sink: InputSink) {
        info!("headless input device started");
        *self.sink.lock() = Some(sink);
    }

    fn stop(&self) {
        if self.sink.lock().take().is_some() {
            info!("headless input device stopped");
        }
    }
}

/// Display surface with a settable geometry
#[derive(Debug)]
pub struct HeadlessDisplay {
    area: Mutex<DisplayRect>,
}

impl HeadlessDisplay {
    pub fn new(area: DisplayRect) -> Self {
        Self {
            area: Mutex::new(area),
        }
    }

    /// Simulate the projection widget moving or changing size
    pub fn set_area(&self, area: DisplayRect) {
        *self.area.lock() = area;
    }
}

impl DisplaySurface for HeadlessDisplay {
    fn active_area(&self) -> DisplayRect {
        *self.area.lock()
    }
}

/// Bluetooth adapter with an in-memory pairing table
#[derive(Debug)]
pub struct HeadlessBluetooth {
    address: String,
    paired: Mutex<HashSet<String>>,
}

impl HeadlessBluetooth {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            paired: Mutex::new(HashSet::new()),
        }
    }

    /// Record `address` as paired
    pub fn pair(&self, address: impl Into<String>) {
        self.paired.lock().insert(address.into().to_uppercase());
    }
}

impl BluetoothDevice for HeadlessBluetooth {
    fn is_available(&self) -> bool {
        true
    }

    fn adapter_address(&self) -> String {
        self.address.clone()
    }

    fn is_paired(&self, address: &str) -> bool {
        self.paired.lock().contains(&address.to_uppercase())
    }
}

/// Concrete headless collaborators, kept accessible for inspection
#[derive(Debug, Clone)]
pub struct HeadlessPlatform {
    pub video: Arc<HeadlessVideoOutput>,
    pub media_audio: Arc<HeadlessAudioOutput>,
    pub speech_audio: Arc<HeadlessAudioOutput>,
    pub system_audio: Arc<HeadlessAudioOutput>,
    pub input: Arc<HeadlessInputDevice>,
    pub display: Arc<HeadlessDisplay>,
    pub bluetooth: Option<Arc<HeadlessBluetooth>>,
}

impl HeadlessPlatform {
    /// Headless collaborators for a display of the given geometry
    pub fn new(area: DisplayRect, bluetooth_address: Option<&str>) -> Self {
        Self {
            video: Arc::new(HeadlessVideoOutput::new()),
            media_audio: Arc::new(HeadlessAudioOutput::new("media")),
            speech_audio: Arc::new(HeadlessAudioOutput::new("speech")),
            system_audio: Arc::new(HeadlessAudioOutput::new("system")),
            input: Arc::new(HeadlessInputDevice::new()),
            display: Arc::new(HeadlessDisplay::new(area)),
            bluetooth: bluetooth_address.map(|a| Arc::new(HeadlessBluetooth::new(a))),
        }
    }

    /// Collaborator bundle handed to the registry
    pub fn platform(&self) -> Platform {
        Platform {
            video: self.video.clone(),
            media_audio: self.media_audio.clone(),
            speech_audio: self.speech_audio.clone(),
            system_audio: self.system_audio.clone(),
            input: self.input.clone(),
            display: self.display.clone(),
            bluetooth: self
                .bluetooth
                .clone()
                .map(|b| b as Arc<dyn BluetoothDevice>),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_refuses_open() {
        let video = HeadlessVideoOutput::new();
        video.refuse_open(true);
        assert!(video.open().is_err());
        video.refuse_open(false);
        assert!(video.open().is_ok());
        assert!(video.is_open());
        video.stop();
        assert!(!video.is_open());
    }

    #[test]
    fn test_input_inject_requires_start() {
        let input = HeadlessInputDevice::new();
        assert!(!input.inject(DeviceEvent::Wheel { delta: 1 }));
        input.start(InputSink::new(|_| true));
        assert!(input.inject(DeviceEvent::Wheel { delta: -1 }));
        input.stop();
        assert!(!input.is_started());
    }

    #[test]
    fn test_bluetooth_pairing_is_case_insensitive() {
        let bt = HeadlessBluetooth::new("00:11:22:33:44:55");
        bt.pair("aa:bb:cc:dd:ee:ff");
        assert!(bt.is_paired("AA:BB:CC:DD:EE:FF"));
        assert!(!bt.is_paired("11:11:11:11:11:11"));
    }
}
