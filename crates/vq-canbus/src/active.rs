//! Active VIN query: Mode 09 PID 02 over ISO-TP, on both 11-bit and 29-bit
//! diagnostic addressing.
//!
//! The exchange has two steps. Step one sends the Mode 09 request to the
//! functional addresses and waits for the First Frame. Step two sends a Flow
//! Control (ContinueToSend) to the physical ECU address and waits for
//! Consecutive Frames 1 and 2. Which addressing scheme the ECU answers on is
//! not known up front, so every query goes out on both.

use tracing::{debug, trace};

use crate::types::{
    CanFrame, ISOTP_FLOW_CONTROL_CTS, MODE_VEHICLE_INFO, OBD_EXT_PHYSICAL_REQUEST_ID,
    OBD_EXT_REQUEST_ID, OBD_EXT_RESPONSE_ID, OBD_PHYSICAL_REQUEST_ID, OBD_REQUEST_ID,
    OBD_RESPONSE_ID, OutboundMessage, PID_VIN, ProtocolStep, VIN_RESPONSE_PREFIX_LEN, Vin,
};
use crate::validator;

/// Whether a CAN ID is one of the ECU response addresses this session reads.
pub fn is_vin_response(id: u32) -> bool {
    id == OBD_RESPONSE_ID || id == OBD_EXT_RESPONSE_ID
}

/// Outcome of decoding a reassembled VIN response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VinDecode {
    /// The bytes after the response prefix were valid text.
    Decoded(Vin),
    /// Decoding failed; whatever VIN was held before stays in place.
    Retained,
}

/// Decode the VIN from a reassembled Mode 09 PID 02 payload.
///
/// Some ECUs answer with bytes that are not valid UTF-8, so a failure here is
/// an expected outcome rather than an error.
pub fn decode_vin(payload: &[u8]) -> VinDecode {
    let Some(vin_bytes) = payload.get(VIN_RESPONSE_PREFIX_LEN..) else {
        return VinDecode::Retained;
    };
    match Vin::from_utf8(vin_bytes) {
        Ok(vin) => VinDecode::Decoded(vin),
        Err(e) => {
            debug!(error = %e, "keeping previous VIN");
            VinDecode::Retained
        }
    }
}

/// The two query frames sent for `step` on `bus`, extended addressing first.
pub fn query_messages(step: ProtocolStep, bus: u8) -> [OutboundMessage; 2] {
    match step {
        ProtocolStep::AwaitingFirstFrame => {
            let request = [0x02, MODE_VEHICLE_INFO, PID_VIN];
            [
                OutboundMessage::padded(OBD_EXT_REQUEST_ID, &request, bus),
                OutboundMessage::padded(OBD_REQUEST_ID, &request, bus),
            ]
        }
        ProtocolStep::AwaitingConsecutiveFrames => [
            OutboundMessage::padded(OBD_EXT_PHYSICAL_REQUEST_ID, &[ISOTP_FLOW_CONTROL_CTS], bus),
            OutboundMessage::padded(OBD_PHYSICAL_REQUEST_ID, &[ISOTP_FLOW_CONTROL_CTS], bus),
        ],
    }
}

/// Request/response state for one VIN query on one bus.
#[derive(Debug)]
pub struct ActiveQuerySession {
    bus: u8,
    step: ProtocolStep,
    /// Valid frames taken for the current step since the last query.
    fragment_count: u8,
    /// The current step got all its frames; cleared when the next query goes out.
    responded: bool,
    never_responded: bool,
    /// Never cleared; the resend rule keeps it within one response.
    buffer: Vec<u8>,
    got_vin: bool,
    vin: Vin,
}

impl ActiveQuerySession {
    pub fn new(bus: u8) -> Self {
        Self {
            bus,
            step: ProtocolStep::AwaitingFirstFrame,
            fragment_count: 0,
            responded: false,
            never_responded: true,
            buffer: Vec::with_capacity(20),
            got_vin: false,
            vin: Vin::unknown(),
        }
    }

    pub fn bus(&self) -> u8 {
        self.bus
    }

    pub fn step(&self) -> ProtocolStep {
        self.step
    }

    pub fn fragment_count(&self) -> u8 {
        self.fragment_count
    }

    /// Reassembled bytes so far, PCI headers stripped.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Whether every frame of the response has been reassembled.
    pub fn is_complete(&self) -> bool {
        self.got_vin
    }

    /// Feed one received frame. Returns `true` once the response is complete.
    pub fn on_frame(&mut self, frame: &CanFrame) -> bool {
        if self.got_vin || frame.bus != self.bus || !is_vin_response(frame.id) {
            return self.got_vin;
        }
        self.never_responded = false;

        if !validator::is_valid(&frame.data, self.step, self.fragment_count) {
            trace!(
                can_id = format!("0x{:X}", frame.id),
                step = self.step.index(),
                fragment_count = self.fragment_count,
                "dropping unexpected VIN response frame"
            );
            return false;
        }

        self.buffer
            .extend_from_slice(&frame.data[self.step.header_len()..]);
        self.fragment_count += 1;
        debug!(
            bus = self.bus,
            can_id = format!("0x{:X}", frame.id),
            step = self.step.index(),
            fragment_count = self.fragment_count,
            "VIN response fragment"
        );

        if self.fragment_count == self.step.required_fragments() {
            self.responded = true;
            match self.step.next() {
                Some(next) => self.step = next,
                None => {
                    self.got_vin = true;
                    debug!(bus = self.bus, bytes = self.buffer.len(), "VIN response reassembled");
                }
            }
        }

        self.got_vin
    }

    /// Queries to transmit this round, if any.
    ///
    /// Queries repeat while no ECU has answered at all, and go out once for
    /// each step after the previous one completed. A step that stalls midway
    /// is not re-queried.
    pub fn decide_resend(&mut self) -> Option<[OutboundMessage; 2]> {
        if !(self.never_responded || (self.responded && !self.got_vin)) {
            return None;
        }

        self.responded = false;
        self.fragment_count = 0;

        trace!(bus = self.bus, step = self.step.index(), "sending VIN query");
        Some(query_messages(self.step, self.bus))
    }

    /// The VIN decoded from the response, or the previous value (initially
    /// the unknown sentinel) if the response is incomplete or not text.
    pub fn resolve_vin(&mut self) -> Vin {
        if self.got_vin
            && self.responded
            && let VinDecode::Decoded(vin) = decode_vin(&self.buffer)
        {
            self.vin = vin;
        }
        self.vin.clone()
    }
}
