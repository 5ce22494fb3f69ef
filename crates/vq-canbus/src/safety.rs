//! CAN bus safety guard — enforces read-only transmission.
//!
//! The only frames this crate ever puts on the bus are:
//! - Mode 0x09 single-frame requests (vehicle information)
//! - ISO-TP Flow Control frames continuing a response
//!
//! Everything else (Mode 0x04 clear DTCs, Mode 0x08 on-board control, ...) is
//! rejected before any bytes hit the bus.

use crate::error::{CanError, CanResult};
use crate::types::OutboundMessage;

/// OBD-II modes allowed to be requested.
pub const ALLOWED_MODES: &[u8] = &[0x09];

/// Validates that an OBD-II mode is allowed under the current safety policy.
pub fn is_mode_allowed(mode: u8) -> bool {
    ALLOWED_MODES.contains(&mode)
}

/// Check an outbound message against the transmit policy.
///
/// Byte 0 is the ISO-TP PCI: 0x01–0x07 is a single-frame request whose
/// byte 1 is the OBD-II mode; upper nibble 0x3 is Flow Control.
pub fn check_outbound(msg: &OutboundMessage) -> CanResult<()> {
    let pci = msg.data[0];
    match pci {
        0x01..=0x07 => {
            let mode = msg.data[1];
            if is_mode_allowed(mode) {
                Ok(())
            } else {
                Err(CanError::SafetyViolation { mode })
            }
        }
        0x30..=0x32 => Ok(()),
        _ => Err(CanError::Interface(format!(
            "refusing to send frame 0x{:X} with PCI 0x{pci:02X}",
            msg.id
        ))),
    }
}
