//! Core CAN bus types, OBD-II / ISO-TP constants, and the VIN value type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CanError, CanResult};

// ── OBD-II CAN IDs ──────────────────────────────────────────────

/// Standard (11-bit) OBD-II functional request CAN ID.
pub const OBD_REQUEST_ID: u32 = 0x7DF;

/// Standard (11-bit) physical request CAN ID for ECU #1.
pub const OBD_PHYSICAL_REQUEST_ID: u32 = 0x7E0;

/// Standard (11-bit) response CAN ID from ECU #1.
pub const OBD_RESPONSE_ID: u32 = 0x7E8;

/// Extended (29-bit) functional request CAN ID.
pub const OBD_EXT_REQUEST_ID: u32 = 0x18DB_33F1;

/// Extended (29-bit) physical request CAN ID, tester → ECU 0x10.
pub const OBD_EXT_PHYSICAL_REQUEST_ID: u32 = 0x18DA_10F1;

/// Extended (29-bit) response CAN ID, ECU 0x10 → tester.
pub const OBD_EXT_RESPONSE_ID: u32 = 0x18DA_F110;

/// Highest arbitration ID that fits an 11-bit standard frame.
pub const STANDARD_ID_MAX: u32 = 0x7FF;

// ── Component protection broadcast IDs ──────────────────────────

/// VIN mux broadcast observed on VW PQ platforms.
pub const VIN_BROADCAST_ID_PQ: u32 = 0x5D2;

/// VIN mux broadcast observed on VW MQB platforms.
pub const VIN_BROADCAST_ID_MQB: u32 = 0x6B4;

// ── OBD-II Mode 09 ──────────────────────────────────────────────

/// Mode 09: Request vehicle information (VIN, etc.).
pub const MODE_VEHICLE_INFO: u8 = 0x09;

/// Mode 09 PID 02: Vehicle Identification Number.
pub const PID_VIN: u8 = 0x02;

// ── ISO-TP framing ──────────────────────────────────────────────

/// Every ISO-TP frame on classic CAN carries exactly 8 bytes.
pub const ISOTP_FRAME_LEN: usize = 8;

/// First Frame PCI byte for a payload shorter than 256 bytes.
pub const ISOTP_FIRST_FRAME: u8 = 0x10;

/// Declared payload length of a VIN response: SID + PID + count + 17 chars.
pub const VIN_RESPONSE_LEN: u8 = 0x14;

/// Consecutive Frame PCI bytes for sequence numbers 1 and 2.
pub const ISOTP_CONSECUTIVE_1: u8 = 0x21;
pub const ISOTP_CONSECUTIVE_2: u8 = 0x22;

/// Flow Control, ContinueToSend.
pub const ISOTP_FLOW_CONTROL_CTS: u8 = 0x30;

/// Bytes before the VIN in a reassembled response (0x49 0x02 0x01).
pub const VIN_RESPONSE_PREFIX_LEN: usize = 3;

/// VIN length in characters.
pub const VIN_LEN: usize = 17;

// ── CAN Frame ───────────────────────────────────────────────────

/// A CAN frame as delivered by a frame source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    /// Bus the frame was received on.
    pub bus: u8,
    /// Arbitration ID (11-bit standard or 29-bit extended).
    pub id: u32,
    /// Data payload (0–8 bytes for classic CAN).
    pub data: Vec<u8>,
}

impl CanFrame {
    pub fn new(bus: u8, id: u32, data: Vec<u8>) -> Self {
        Self { bus, id, data }
    }
}

// ── Outbound Message ────────────────────────────────────────────

/// A frame queued for transmission. Always a full 8-byte payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutboundMessage {
    pub id: u32,
    pub data: [u8; ISOTP_FRAME_LEN],
    pub bus: u8,
}

impl OutboundMessage {
    /// Build a message whose payload is `bytes` zero-padded to 8 bytes.
    ///
    /// Bytes past the eighth are dropped.
    pub fn padded(id: u32, bytes: &[u8], bus: u8) -> Self {
        let mut data = [0u8; ISOTP_FRAME_LEN];
        let n = bytes.len().min(ISOTP_FRAME_LEN);
        data[..n].copy_from_slice(&bytes[..n]);
        Self { id, data, bus }
    }

    /// Whether the ID needs a 29-bit extended frame.
    pub fn is_extended(&self) -> bool {
        self.id > STANDARD_ID_MAX
    }
}

// ── Protocol Step ───────────────────────────────────────────────

/// Which part of the ISO-TP VIN exchange is expected next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolStep {
    /// Mode 09 request sent, waiting for the First Frame.
    AwaitingFirstFrame,
    /// Flow Control sent, waiting for Consecutive Frames 1 and 2.
    AwaitingConsecutiveFrames,
}

impl ProtocolStep {
    /// Zero-based position of the step in the exchange.
    pub fn index(self) -> usize {
        match self {
            Self::AwaitingFirstFrame => 0,
            Self::AwaitingConsecutiveFrames => 1,
        }
    }

    /// Number of valid frames that complete this step.
    pub fn required_fragments(self) -> u8 {
        match self {
            Self::AwaitingFirstFrame => 1,
            Self::AwaitingConsecutiveFrames => 2,
        }
    }

    /// The step that follows, or `None` once the exchange is complete.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::AwaitingFirstFrame => Some(Self::AwaitingConsecutiveFrames),
            Self::AwaitingConsecutiveFrames => None,
        }
    }

    /// Bytes of PCI header stripped before a fragment is reassembled.
    pub fn header_len(self) -> usize {
        match self {
            Self::AwaitingFirstFrame => 2,
            Self::AwaitingConsecutiveFrames => 1,
        }
    }
}

// ── VIN ─────────────────────────────────────────────────────────

/// A Vehicle Identification Number.
///
/// Seventeen '0' characters stand for "no VIN recovered".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vin(String);

impl Vin {
    /// The sentinel returned when no VIN could be recovered.
    pub fn unknown() -> Self {
        Self("0".repeat(VIN_LEN))
    }

    /// Decode raw bytes as UTF-8.
    ///
    /// The length is not checked: some ECUs pad or truncate their answer and
    /// callers still want whatever text came back.
    pub fn from_utf8(bytes: &[u8]) -> CanResult<Self> {
        std::str::from_utf8(bytes)
            .map(|s| Self(s.to_string()))
            .map_err(|e| CanError::Decode(format!("VIN not valid UTF-8: {e}")))
    }

    pub fn is_unknown(&self) -> bool {
        self.0.len() == VIN_LEN && self.0.bytes().all(|b| b == b'0')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Vin {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for Vin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
