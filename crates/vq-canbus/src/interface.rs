//! CAN bus interface abstraction.
//!
//! The acquisition loop only needs two things from a transport: the next batch
//! of received frames (`FrameSource`) and a way to put frames on the bus
//! (`FrameSink`). Two impls:
//! - `SocketCanInterface` — Linux-only, one raw `socketcan::CanSocket` per bus
//! - `MockCanInterface` — all platforms, scripted batches (in `mock.rs`)
//!
//! Safety enforcement happens at the interface level: `send` rejects anything
//! but Mode 0x09 requests and flow control before any bytes hit the bus.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::CanResult;
use crate::types::{CanFrame, OutboundMessage};

/// Supplies received frames.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Return every frame currently available, waiting up to `timeout` for
    /// the first one. An empty batch is a normal result.
    async fn poll(&self, timeout: Duration) -> CanResult<Vec<CanFrame>>;
}

/// Transmits frames. Fire-and-forget: `Ok` means handed to the transport.
#[async_trait]
pub trait FrameSink: Send + Sync {
    async fn send(&self, messages: &[OutboundMessage]) -> CanResult<()>;
}

// ── SocketCAN (Linux-only) ──────────────────────────────────────

#[cfg(target_os = "linux")]
pub use self::linux::SocketCanInterface;

#[cfg(target_os = "linux")]
mod linux {
    use std::io::ErrorKind;
    use std::time::Duration;

    use async_trait::async_trait;
    use socketcan::{
        CanFrame as RawFrame, CanSocket, EmbeddedFrame, ExtendedId, Frame, Socket, StandardId,
    };
    use tracing::{debug, trace};

    use super::{FrameSink, FrameSource};
    use crate::error::{CanError, CanResult};
    use crate::safety;
    use crate::types::{CanFrame, OutboundMessage};

    /// Raw SocketCAN sockets, one per bus. Bus `n` is the `n`th interface name.
    pub struct SocketCanInterface {
        sockets: Vec<(String, CanSocket)>,
    }

    impl SocketCanInterface {
        /// Open a non-blocking raw socket on each interface (e.g. "can0").
        /// At most 256 interfaces, since bus numbers are `u8`.
        pub fn open<S: AsRef<str>>(interfaces: &[S]) -> CanResult<Self> {
            bus_number(interfaces.len().saturating_sub(1))?;
            let mut sockets = Vec::with_capacity(interfaces.len());
            for name in interfaces {
                let name = name.as_ref();
                let socket = CanSocket::open(name).map_err(|e| {
                    CanError::Interface(format!("failed to open raw CAN socket on {name}: {e}"))
                })?;
                socket.set_nonblocking(true)?;
                debug!(interface = name, bus = sockets.len(), "CAN socket open");
                sockets.push((name.to_string(), socket));
            }
            Ok(Self { sockets })
        }

        pub fn bus_count(&self) -> usize {
            self.sockets.len()
        }

        /// Read everything pending on every socket without blocking.
        fn drain(&self) -> CanResult<Vec<CanFrame>> {
            let mut frames = Vec::new();
            for (bus, (name, socket)) in self.sockets.iter().enumerate() {
                loop {
                    match socket.read_frame() {
                        Ok(frame @ RawFrame::Data(_)) => {
                            let data = frame.data().to_vec();
                            frames.push(CanFrame::new(bus_number(bus)?, frame.raw_id(), data));
                        }
                        Ok(_) => {} // remote / error frames
                        Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                        Err(e) => {
                            let msg = format!("read on {name} failed: {e}");
                            return Err(CanError::Interface(msg));
                        }
                    }
                }
            }
            Ok(frames)
        }
    }

    fn bus_number(index: usize) -> CanResult<u8> {
        u8::try_from(index)
            .map_err(|_| CanError::Interface(format!("bus index {index} exceeds 255")))
    }

    fn to_raw(msg: &OutboundMessage) -> CanResult<RawFrame> {
        let frame = if msg.is_extended() {
            ExtendedId::new(msg.id).and_then(|id| RawFrame::new(id, &msg.data))
        } else {
            StandardId::new(msg.id as u16).and_then(|id| RawFrame::new(id, &msg.data))
        };
        frame.ok_or_else(|| CanError::Interface(format!("invalid CAN ID 0x{:X}", msg.id)))
    }

    #[async_trait]
    impl FrameSource for SocketCanInterface {
        async fn poll(&self, timeout: Duration) -> CanResult<Vec<CanFrame>> {
            let frames = self.drain()?;
            if !frames.is_empty() {
                return Ok(frames);
            }
            tokio::time::sleep(timeout).await;
            self.drain()
        }
    }

    #[async_trait]
    impl FrameSink for SocketCanInterface {
        async fn send(&self, messages: &[OutboundMessage]) -> CanResult<()> {
            for msg in messages {
                safety::check_outbound(msg)?;
                let (name, socket) = self.sockets.get(usize::from(msg.bus)).ok_or_else(|| {
                    CanError::Interface(format!("no CAN interface configured for bus {}", msg.bus))
                })?;
                socket
                    .write_frame(&to_raw(msg)?)
                    .map_err(|e| CanError::Interface(format!("write on {name} failed: {e}")))?;
                trace!(interface = %name, can_id = format!("0x{:X}", msg.id), "frame sent");
            }
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::types::{OBD_EXT_REQUEST_ID, OBD_REQUEST_ID};

        #[test]
        fn raw_frame_addressing() {
            let request = OutboundMessage::padded(OBD_REQUEST_ID, &[0x02, 0x09, 0x02], 0);
            let standard = to_raw(&request).unwrap();
            assert_eq!(standard.raw_id(), OBD_REQUEST_ID);
            assert_eq!(standard.data(), &[0x02, 0x09, 0x02, 0, 0, 0, 0, 0]);

            let ext = to_raw(&OutboundMessage::padded(OBD_EXT_REQUEST_ID, &[0x30], 0)).unwrap();
            assert_eq!(ext.raw_id(), OBD_EXT_REQUEST_ID);
        }

        #[test]
        fn bus_numbers_fit_in_u8() {
            assert_eq!(bus_number(0).unwrap(), 0);
            assert_eq!(bus_number(255).unwrap(), 255);
            assert!(matches!(bus_number(256), Err(CanError::Interface(_))));
        }

        #[test]
        fn too_many_interfaces_rejected_before_opening() {
            let names = vec!["vcan0"; 257];
            let err = SocketCanInterface::open(&names[..]).err().unwrap();
            assert!(err.to_string().contains("256"));
        }

        #[test]
        fn out_of_range_id_rejected() {
            let msg = OutboundMessage::padded(0x2000_0000, &[0x30], 0);
            assert!(to_raw(&msg).is_err());
        }
    }
}
