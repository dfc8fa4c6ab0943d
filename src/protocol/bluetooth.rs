//! Bluetooth pairing messages

use serde::{Deserialize, Serialize};

use super::{lift, Status};

/// Pairing profiles the head unit supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BluetoothPairingMethod {
    Oob,
    A2dp,
    Hfp,
    Pin,
}

/// Phone announces it wants to pair over Bluetooth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BluetoothPairingRequest {
    pub phone_address: String,
    pub pairing_method: BluetoothPairingMethod,
}

/// Answer to a [`BluetoothPairingRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BluetoothPairingResponse {
    pub already_paired: bool,
    pub status: Status,
}

/// Inbound bluetooth vocabulary
#[derive(Debug, Clone, PartialEq)]
pub enum BluetoothMessage {
    PairingRequest(BluetoothPairingRequest),
}

impl BluetoothMessage {
    /// Message name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PairingRequest(_) => "BluetoothPairingRequest",
        }
    }
}

/// Outbound bluetooth vocabulary
#[derive(Debug, Clone, PartialEq)]
pub enum BluetoothOutbound {
    PairingResponse(BluetoothPairingResponse),
}

impl BluetoothOutbound {
    /// Message name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PairingResponse(_) => "BluetoothPairingResponse",
        }
    }
}

lift!(InboundMessage::Bluetooth(BluetoothMessage::PairingRequest(BluetoothPairingRequest)));
lift!(OutboundMessage::Bluetooth(BluetoothOutbound::PairingResponse(BluetoothPairingResponse)));
