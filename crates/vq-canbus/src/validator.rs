//! Sanity checks on ISO-TP frames answering a Mode 09 PID 02 query.

use crate::types::{
    ISOTP_CONSECUTIVE_1, ISOTP_CONSECUTIVE_2, ISOTP_FIRST_FRAME, ISOTP_FRAME_LEN, ProtocolStep,
    VIN_RESPONSE_LEN,
};

/// Whether `payload` is the frame expected at `step` after `fragment_count`
/// valid frames have already been taken for that step.
///
/// Pure: malformed frames are reported as `false`, never as an error.
pub fn is_valid(payload: &[u8], step: ProtocolStep, fragment_count: u8) -> bool {
    if payload.len() != ISOTP_FRAME_LEN {
        return false;
    }

    match (step, fragment_count) {
        // VIN does not fit one frame: First Frame announcing 20 bytes.
        (ProtocolStep::AwaitingFirstFrame, _) => {
            payload[0] == ISOTP_FIRST_FRAME && payload[1] == VIN_RESPONSE_LEN
        }
        (ProtocolStep::AwaitingConsecutiveFrames, 0) => payload[0] == ISOTP_CONSECUTIVE_1,
        (ProtocolStep::AwaitingConsecutiveFrames, 1) => payload[0] == ISOTP_CONSECUTIVE_2,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIRST: ProtocolStep = ProtocolStep::AwaitingFirstFrame;
    const CONSECUTIVE: ProtocolStep = ProtocolStep::AwaitingConsecutiveFrames;

    #[test]
    fn rejects_wrong_length() {
        for len in [0usize, 1, 2, 7, 9, 16] {
            let mut payload = vec![0u8; len];
            if len >= 2 {
                payload[0] = 0x10;
                payload[1] = 0x14;
            }
            assert!(!is_valid(&payload, FIRST, 0), "len {len}");
            assert!(!is_valid(&payload, CONSECUTIVE, 0), "len {len}");
            assert!(!is_valid(&payload, CONSECUTIVE, 5), "len {len}");
        }
    }

    #[test]
    fn first_frame() {
        assert!(is_valid(&[0x10, 0x14, 0x49, 0x02, 0x01, 0x31, 0x48, 0x47], FIRST, 0));
        assert!(!is_valid(&[0x10, 0x13, 0x49, 0x02, 0x01, 0x31, 0x48, 0x47], FIRST, 0));
        assert!(!is_valid(&[0x11, 0x14, 0x49, 0x02, 0x01, 0x31, 0x48, 0x47], FIRST, 0));
        // single frame negative response
        assert!(!is_valid(&[0x03, 0x7F, 0x09, 0x12, 0, 0, 0, 0], FIRST, 0));
    }

    #[test]
    fn consecutive_frames_in_order() {
        let cf1 = [0x21, 0x43, 0x4D, 0x38, 0x32, 0x36, 0x33, 0x33];
        let cf2 = [0x22, 0x41, 0x30, 0x30, 0x34, 0x33, 0x35, 0x32];
        assert!(is_valid(&cf1, CONSECUTIVE, 0));
        assert!(!is_valid(&cf2, CONSECUTIVE, 0));
        assert!(is_valid(&cf2, CONSECUTIVE, 1));
        assert!(!is_valid(&cf1, CONSECUTIVE, 1));
    }

    #[test]
    fn later_fragments_only_check_length() {
        assert!(is_valid(&[0xFF; 8], CONSECUTIVE, 2));
        assert!(is_valid(&[0x00; 8], CONSECUTIVE, 3));
    }

    #[test]
    fn deterministic() {
        let payload = [0x21, 1, 2, 3, 4, 5, 6, 7];
        let a = is_valid(&payload, CONSECUTIVE, 0);
        let b = is_valid(&payload, CONSECUTIVE, 0);
        assert_eq!(a, b);
    }
}
