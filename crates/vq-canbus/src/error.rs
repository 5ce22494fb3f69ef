//! CAN bus error types.

use thiserror::Error;

/// Errors raised by frame sources, frame sinks and the transmit guard.
///
/// None of these escape [`crate::acquisition::acquire_vin`]; the acquisition
/// loop logs them and keeps polling until its step budget runs out.
#[derive(Debug, Error)]
pub enum CanError {
    #[error("CAN interface error: {0}")]
    Interface(String),

    #[error("Safety violation: mode 0x{mode:02X} is not allowed")]
    SafetyViolation { mode: u8 },

    #[error("Frame decode error: {0}")]
    Decode(String),
}

impl From<std::io::Error> for CanError {
    fn from(e: std::io::Error) -> Self {
        Self::Interface(e.to_string())
    }
}

/// Convenience alias for CAN bus results.
pub type CanResult<T> = Result<T, CanError>;
