//! Passive VIN listener for component-protection broadcasts.
//!
//! Some VW PQ/MQB vehicles broadcast the VIN unsolicited, split across three
//! mux frames on 0x5D2 or 0x6B4. Byte 0 is the mux index; the VIN text starts
//! at byte 5 of mux 0 and byte 1 of muxes 1 and 2. These IDs are community
//! reverse-engineered and may carry unrelated data on other vehicles, so a
//! result from this path is best effort.

use tracing::debug;

use crate::types::{CanFrame, VIN_BROADCAST_ID_MQB, VIN_BROADCAST_ID_PQ, Vin};

/// Offset of VIN text in each mux frame, indexed by mux number.
const FRAGMENT_OFFSETS: [usize; 3] = [5, 1, 1];

/// Whether a CAN ID carries the component-protection VIN broadcast.
pub fn is_vin_broadcast(id: u32) -> bool {
    id == VIN_BROADCAST_ID_PQ || id == VIN_BROADCAST_ID_MQB
}

/// Collects the three broadcast fragments; last write per index wins.
#[derive(Debug, Default)]
pub struct PassiveListener {
    fragments: [Option<Vec<u8>>; 3],
    vin: Option<Vin>,
}

impl PassiveListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_complete(&self) -> bool {
        self.vin.is_some()
    }

    /// The assembled VIN, once all three fragments decoded as text.
    pub fn vin(&self) -> Option<&Vin> {
        self.vin.as_ref()
    }

    /// Feed one received frame, from any bus. Returns `true` once complete.
    pub fn on_frame(&mut self, frame: &CanFrame) -> bool {
        if !is_vin_broadcast(frame.id) {
            return self.is_complete();
        }

        let Some(&index) = frame.data.first() else {
            return self.is_complete();
        };
        let index = usize::from(index);
        let Some(&offset) = FRAGMENT_OFFSETS.get(index) else {
            return self.is_complete();
        };

        self.fragments[index] = Some(frame.data.get(offset..).unwrap_or_default().to_vec());

        if let [Some(a), Some(b), Some(c)] = &self.fragments
            && !a.is_empty()
            && !b.is_empty()
            && !c.is_empty()
        {
            let bytes = [a.as_slice(), b.as_slice(), c.as_slice()].concat();
            match Vin::from_utf8(&bytes) {
                Ok(vin) => {
                    debug!(
                        can_id = format!("0x{:X}", frame.id),
                        %vin,
                        "VIN assembled from broadcast"
                    );
                    self.vin = Some(vin);
                }
                Err(e) => debug!(error = %e, "discarding broadcast VIN"),
            }
        }

        self.is_complete()
    }
}
