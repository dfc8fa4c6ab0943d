//! Input messages
//!
//! Unlike the status channels, input is command-emitting: after the phone
//! binds the keys it wants, the head unit streams button, rotary and touch
//! events to it.

use serde::{Deserialize, Serialize};

use super::{lift, Status};

/// Key codes understood by the phone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum ButtonCode {
    Menu = 1,
    Microphone1 = 2,
    Home = 3,
    Back = 4,
    Phone = 5,
    CallEnd = 6,
    Up = 19,
    Down = 20,
    Left = 21,
    Right = 22,
    Enter = 23,
    Microphone2 = 84,
    TogglePlay = 85,
    Next = 87,
    Previous = 88,
    Play = 126,
    Pause = 127,
    MusicPlayer = 209,
    /// Rotary controller, reported through relative events
    ScrollWheel = 65536,
}

impl ButtonCode {
    const ALL: [ButtonCode; 19] = [
        Self::Menu,
        Self::Microphone1,
        Self::Home,
        Self::Back,
        Self::Phone,
        Self::CallEnd,
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
        Self::Enter,
        Self::Microphone2,
        Self::TogglePlay,
        Self::Next,
        Self::Previous,
        Self::Play,
        Self::Pause,
        Self::MusicPlayer,
        Self::ScrollWheel,
    ];

    /// Scan code as carried on the wire
    pub fn scan_code(self) -> u32 {
        self as u32
    }

    /// Look a button up by its scan code
    pub fn from_scan_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.scan_code() == code)
    }

    /// Every known button code
    pub fn all() -> &'static [ButtonCode] {
        &Self::ALL
    }
}

/// Phone asks which scan codes it may receive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingRequest {
    pub scan_codes: Vec<u32>,
}

/// Answer to a [`BindingRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingResponse {
    pub status: Status,
}

/// Key press or release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub scan_code: u32,
    pub is_pressed: bool,
    pub meta: u32,
    pub long_press: bool,
}

/// Rotary step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeEvent {
    pub scan_code: u32,
    pub delta: i32,
}

/// Touch gesture phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchAction {
    Press,
    Release,
    Drag,
    PointerDown,
    PointerUp,
}

/// One touch point in video coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchLocation {
    pub x: u32,
    pub y: u32,
    pub pointer_id: u32,
}

/// Touch gesture update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TouchEvent {
    pub action: TouchAction,
    pub action_index: u32,
    pub locations: Vec<TouchLocation>,
}

/// Payload of an [`InputEventIndication`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Buttons(Vec<ButtonEvent>),
    Relative(RelativeEvent),
    Touch(TouchEvent),
}

/// Input event pushed to the phone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEventIndication {
    /// Microseconds since the Unix epoch
    pub timestamp: u64,
    pub disp_channel: u32,
    pub event: InputEvent,
}

/// Inbound input vocabulary
#[derive(Debug, Clone, PartialEq)]
pub enum InputMessage {
    BindingRequest(BindingRequest),
}

impl InputMessage {
    /// Message name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BindingRequest(_) => "BindingRequest",
        }
    }
}

/// Outbound input vocabulary
#[derive(Debug, Clone, PartialEq)]
pub enum InputOutbound {
    BindingResponse(BindingResponse),
    EventIndication(InputEventIndication),
}

impl InputOutbound {
    /// Message name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BindingResponse(_) => "BindingResponse",
            Self::EventIndication(_) => "InputEventIndication",
        }
    }
}

lift!(InboundMessage::Input(InputMessage::BindingRequest(BindingRequest)));
lift!(OutboundMessage::Input(InputOutbound::BindingResponse(BindingResponse)));
lift!(OutboundMessage::Input(InputOutbound::EventIndication(InputEventIndication)));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_code_lookup() {
        for button in ButtonCode::all() {
            assert_eq!(ButtonCode::from_scan_code(button.scan_code()), Some(*button));
        }
        assert_eq!(ButtonCode::from_scan_code(9999), None);
    }

    #[test]
    fn test_button_code_config_names() {
        let parsed: Vec<ButtonCode> =
            serde_json::from_str(r#"["enter", "scroll_wheel", "toggle_play"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![ButtonCode::Enter, ButtonCode::ScrollWheel, ButtonCode::TogglePlay]
        );
    }
}
