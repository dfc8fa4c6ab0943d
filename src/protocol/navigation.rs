//! Navigation status messages
//!
//! Turn-by-turn guidance pushed by the phone while a route is active. All of
//! these are notifications: the head unit never answers them.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::lift;

/// Guidance style advertised in the navigation channel descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationTurnType {
    /// Unspecified
    Unknown,
    /// Maneuvers are described by event enumerations
    Enum,
    /// Maneuvers come with a rendered turn image
    Image,
}

/// Navigation state reported by the phone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationState {
    /// Navigation not available on the phone
    Unavailable,
    /// Route guidance running
    Active,
    /// No route in progress
    Inactive,
    /// Recomputing the route
    Rerouting,
    /// Guidance is announcing an upcoming maneuver
    Turn,
}

impl NavigationState {
    /// Protocol name of the state
    pub fn name(self) -> &'static str {
        match self {
            Self::Unavailable => "UNAVAILABLE",
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Rerouting => "REROUTING",
            Self::Turn => "TURN",
        }
    }
}

/// Direction component of a maneuver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManeuverDirection {
    Unknown,
    Left,
    Right,
    Unspecified,
}

impl ManeuverDirection {
    /// Protocol name of the direction
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Unspecified => "UNSPECIFIED",
        }
    }
}

/// Shape of a maneuver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManeuverType {
    Unknown,
    Depart,
    NameChange,
    SlightTurn,
    Turn,
    SharpTurn,
    UTurn,
    OnRamp,
    OffRamp,
    Fork,
    Merge,
    RoundaboutEnter,
    RoundaboutExit,
    RoundaboutEnterAndExit,
    Straight,
    FerryBoat,
    FerryTrain,
    Destination,
}

impl ManeuverType {
    /// Protocol name of the maneuver type
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Depart => "DEPART",
            Self::NameChange => "NAME_CHANGE",
            Self::SlightTurn => "SLIGHT_TURN",
            Self::Turn => "TURN",
            Self::SharpTurn => "SHARP_TURN",
            Self::UTurn => "U_TURN",
            Self::OnRamp => "ON_RAMP",
            Self::OffRamp => "OFF_RAMP",
            Self::Fork => "FORK",
            Self::Merge => "MERGE",
            Self::RoundaboutEnter => "ROUNDABOUT_ENTER",
            Self::RoundaboutExit => "ROUNDABOUT_EXIT",
            Self::RoundaboutEnterAndExit => "ROUNDABOUT_ENTER_AND_EXIT",
            Self::Straight => "STRAIGHT",
            Self::FerryBoat => "FERRY_BOAT",
            Self::FerryTrain => "FERRY_TRAIN",
            Self::Destination => "DESTINATION",
        }
    }
}

/// Unit the phone wants the distance rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistanceUnit {
    Unknown,
    Meters,
    Kilometers,
    /// Kilometers with one decimal place
    Kilometers10,
    Miles,
    /// Miles with one decimal place
    Miles10,
    Feet,
    Yards,
}

impl DistanceUnit {
    /// Protocol name of the unit
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Meters => "METERS",
            Self::Kilometers => "KILOMETERS",
            Self::Kilometers10 => "KILOMETERS10",
            Self::Miles => "MILES",
            Self::Miles10 => "MILES10",
            Self::Feet => "FEET",
            Self::Yards => "YARDS",
        }
    }
}

/// Navigation state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationStatus {
    pub status: NavigationState,
}

/// Next maneuver announcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTurnEvent {
    pub street_name: String,
    pub maneuver_direction: ManeuverDirection,
    pub maneuver_type: ManeuverType,
    /// Rendered turn image (PNG), present with image guidance
    pub turn_image: Option<Bytes>,
    pub roundabout_exit_number: Option<u32>,
    pub roundabout_exit_angle: Option<u32>,
}

impl NavigationTurnEvent {
    /// Turn event without image or roundabout details
    pub fn new(
        street_name: impl Into<String>,
        maneuver_direction: ManeuverDirection,
        maneuver_type: ManeuverType,
    ) -> Self {
        Self {
            street_name: street_name.into(),
            maneuver_direction,
            maneuver_type,
            turn_image: None,
            roundabout_exit_number: None,
            roundabout_exit_angle: None,
        }
    }
}

/// Distance and time remaining to the next maneuver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationDistanceEvent {
    pub meters: u32,
    pub time_to_step_seconds: u32,
    /// Display distance scaled by 1000, in `distance_unit`
    pub distance_to_step_millis: u32,
    pub distance_unit: DistanceUnit,
}

impl NavigationDistanceEvent {
    /// Distance to show on screen, in `distance_unit`
    pub fn display_distance(&self) -> f64 {
        f64::from(self.distance_to_step_millis) / 1000.0
    }
}

/// Inbound navigation vocabulary
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationMessage {
    Status(NavigationStatus),
    TurnEvent(NavigationTurnEvent),
    DistanceEvent(NavigationDistanceEvent),
}

impl NavigationMessage {
    /// Message name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status(_) => "NavigationStatus",
            Self::TurnEvent(_) => "NavigationTurnEvent",
            Self::DistanceEvent(_) => "NavigationDistanceEvent",
        }
    }
}

lift!(InboundMessage::Navigation(NavigationMessage::Status(NavigationStatus)));
lift!(InboundMessage::Navigation(NavigationMessage::TurnEvent(NavigationTurnEvent)));
lift!(InboundMessage::Navigation(NavigationMessage::DistanceEvent(NavigationDistanceEvent)));
