//! Head-unit input vocabulary
//!
//! Keys as the native UI sees them, and the translation onto the phone's
//! button codes. Rotary controllers are modelled as keys that turn a wheel.

use std::fmt;
use std::sync::Arc;

use crate::protocol::input::{ButtonCode, TouchAction};

/// Rotation attached to a button press
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WheelDirection {
    /// Plain button
    #[default]
    None,
    /// One detent counter-clockwise
    Left,
    /// One detent clockwise
    Right,
}

/// Phase of a synthetic button press
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ButtonEventType {
    /// Full click, press immediately followed by release
    #[default]
    None,
    /// Key went down
    Press,
    /// Key went up
    Release,
}

/// Keys delivered by the head unit's UI toolkit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Left,
    Right,
    Up,
    Down,
    Escape,
    Home,
    Phone,
    CallEnd,
    MediaPlay,
    MediaPause,
    MediaTogglePlay,
    MediaNext,
    MediaPrevious,
    Voice,
    Menu,
    Music,
    /// Rotary knob turned counter-clockwise
    RotaryLeft,
    /// Rotary knob turned clockwise
    RotaryRight,
    /// Any key without a phone counterpart
    Other(u32),
}

impl Key {
    /// Phone button and wheel rotation this key maps onto
    pub fn translate(self) -> Option<(ButtonCode, WheelDirection)> {
        let plain = |code| Some((code, WheelDirection::None));
        match self {
            Self::Enter => plain(ButtonCode::Enter),
            Self::Left => plain(ButtonCode::Left),
            Self::Right => plain(ButtonCode::Right),
            Self::Up => plain(ButtonCode::Up),
            Self::Down => plain(ButtonCode::Down),
            Self::Escape => plain(ButtonCode::Back),
            Self::Home => plain(ButtonCode::Home),
            Self::Phone => plain(ButtonCode::Phone),
            Self::CallEnd => plain(ButtonCode::CallEnd),
            Self::MediaPlay => plain(ButtonCode::Play),
            Self::MediaPause => plain(ButtonCode::Pause),
            Self::MediaTogglePlay => plain(ButtonCode::TogglePlay),
            Self::MediaNext => plain(ButtonCode::Next),
            Self::MediaPrevious => plain(ButtonCode::Previous),
            Self::Voice => plain(ButtonCode::Microphone1),
            Self::Menu => plain(ButtonCode::Menu),
            Self::Music => plain(ButtonCode::MusicPlayer),
            Self::RotaryLeft => Some((ButtonCode::ScrollWheel, WheelDirection::Left)),
            Self::RotaryRight => Some((ButtonCode::ScrollWheel, WheelDirection::Right)),
            Self::Other(_) => None,
        }
    }
}

/// Key press or release from the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub pressed: bool,
}

impl KeyEvent {
    /// Key went down
    pub fn press(key: Key) -> Self {
        Self { key, pressed: true }
    }

    /// Key went up
    pub fn release(key: Key) -> Self {
        Self {
            key,
            pressed: false,
        }
    }
}

/// Raw event produced by an [`super::InputDevice`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// Touch in screen coordinates
    Touch {
        action: TouchAction,
        x: i32,
        y: i32,
        pointer_id: u32,
    },
    /// Hard key
    Button { code: ButtonCode, pressed: bool },
    /// Rotary controller steps, negative is counter-clockwise
    Wheel { delta: i32 },
}

/// Where an input device delivers its events
///
/// The sink does not keep the receiving channel alive; once the channel is
/// gone, delivering returns false.
#[derive(Clone)]
pub struct InputSink {
    deliver: Arc<dyn Fn(DeviceEvent) -> bool + Send + Sync>,
}

impl InputSink {
    /// Sink calling `deliver` for every event
    pub fn new(deliver: impl Fn(DeviceEvent) -> bool + Send + Sync + 'static) -> Self {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// Hand one event to the input channel
    pub fn deliver(&self, event: DeviceEvent) -> bool {
        (self.deliver)(event)
    }
}

impl fmt::Debug for InputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputSink").finish_non_exhaustive()
    }
}
