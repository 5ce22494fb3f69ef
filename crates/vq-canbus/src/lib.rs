//! VIN acquisition over CAN.
//!
//! Identifies a vehicle by reading its VIN two ways at once: an active OBD-II
//! Mode 09 PID 02 query reassembled over ISO-TP (11-bit and 29-bit diagnostic
//! addressing), and a passive listener for the component-protection VIN
//! broadcast some vehicles send unsolicited. Transport is abstracted behind
//! `FrameSource` / `FrameSink` so the same loop runs against SocketCAN or the
//! scripted mock.

pub mod acquisition;
pub mod active;
pub mod error;
pub mod interface;
pub mod mock;
pub mod passive;
pub mod safety;
pub mod types;
pub mod validator;

// Re-export key types for convenience
pub use acquisition::{
    AcquisitionConfig, AcquisitionLoop, AcquisitionReport, VinSource, acquire_vin,
};
pub use active::ActiveQuerySession;
pub use error::{CanError, CanResult};
pub use interface::{FrameSink, FrameSource};
#[cfg(target_os = "linux")]
pub use interface::SocketCanInterface;
pub use mock::MockCanInterface;
pub use passive::PassiveListener;
pub use types::{CanFrame, OutboundMessage, ProtocolStep, Vin};
