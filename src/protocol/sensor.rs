//! Sensor messages
//!
//! The phone asks for the sensors it cares about; the head unit confirms and
//! then pushes readings for every started sensor.

use serde::{Deserialize, Serialize};

use super::{lift, Status};

/// Sensor kinds known to the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SensorType {
    Location,
    Compass,
    CarSpeed,
    Rpm,
    Odometer,
    FuelLevel,
    ParkingBrake,
    Gear,
    NightData,
    Environment,
    Hvac,
    DrivingStatus,
    DeadReckoning,
    Passenger,
    Door,
    Light,
    Tire,
    Accel,
    Gyro,
    Gps,
}

impl SensorType {
    /// Protocol name of the sensor
    pub fn name(self) -> &'static str {
        match self {
            Self::Location => "LOCATION",
            Self::Compass => "COMPASS",
            Self::CarSpeed => "CAR_SPEED",
            Self::Rpm => "RPM",
            Self::Odometer => "ODOMETER",
            Self::FuelLevel => "FUEL_LEVEL",
            Self::ParkingBrake => "PARKING_BRAKE",
            Self::Gear => "GEAR",
            Self::NightData => "NIGHT_DATA",
            Self::Environment => "ENVIRONMENT",
            Self::Hvac => "HVAC",
            Self::DrivingStatus => "DRIVING_STATUS",
            Self::DeadReckoning => "DEAD_RECONING",
            Self::Passenger => "PASSENGER",
            Self::Door => "DOOR",
            Self::Light => "LIGHT",
            Self::Tire => "TIRE",
            Self::Accel => "ACCEL",
            Self::Gyro => "GYRO",
            Self::Gps => "GPS",
        }
    }
}

/// Restrictions the vehicle currently places on the phone UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrivingStatus {
    Unrestricted,
    NoVideo,
    NoKeyboardInput,
    NoVoiceInput,
    NoConfig,
    LimitMessageLength,
    Full,
}

/// One sensor sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorReading {
    /// Head unit is in night mode
    NightMode(bool),
    /// Current driving restrictions
    DrivingStatus(DrivingStatus),
    /// GPS fix, coordinates in degrees scaled by 1e7
    Location {
        latitude_e7: i32,
        longitude_e7: i32,
        accuracy_mm: u32,
    },
}

impl SensorReading {
    /// Sensor this reading belongs to
    pub fn sensor_type(&self) -> SensorType {
        match self {
            Self::NightMode(_) => SensorType::NightData,
            Self::DrivingStatus(_) => SensorType::DrivingStatus,
            Self::Location { .. } => SensorType::Location,
        }
    }
}

/// Phone asks the head unit to start reporting a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorStartRequest {
    pub sensor_type: SensorType,
    /// Requested refresh interval in milliseconds
    pub refresh_interval: i64,
}

/// Answer to a [`SensorStartRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorStartResponse {
    pub status: Status,
}

/// Batch of sensor readings pushed to the phone
#[derive(Debug, Clone, PartialEq)]
pub struct SensorEventIndication {
    pub readings: Vec<SensorReading>,
}

impl SensorEventIndication {
    /// Indication carrying a single reading
    pub fn single(reading: SensorReading) -> Self {
        Self {
            readings: vec![reading],
        }
    }
}

/// Inbound sensor vocabulary
#[derive(Debug, Clone, PartialEq)]
pub enum SensorMessage {
    StartRequest(SensorStartRequest),
}

impl SensorMessage {
    /// Message name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StartRequest(_) => "SensorStartRequest",
        }
    }
}

/// Outbound sensor vocabulary
#[derive(Debug, Clone, PartialEq)]
pub enum SensorOutbound {
    StartResponse(SensorStartResponse),
    EventIndication(SensorEventIndication),
}

impl SensorOutbound {
    /// Message name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StartResponse(_) => "SensorStartResponse",
            Self::EventIndication(_) => "SensorEventIndication",
        }
    }
}

lift!(InboundMessage::Sensor(SensorMessage::StartRequest(SensorStartRequest)));
lift!(OutboundMessage::Sensor(SensorOutbound::StartResponse(SensorStartResponse)));
lift!(OutboundMessage::Sensor(SensorOutbound::EventIndication(SensorEventIndication)));
