use crate::rotation::domain::angle_decoder::{AngleDecoder, CornerColors};

/// A channel reads as a set bit at or above the midpoint of its range.
const CHANNEL_THRESHOLD: f64 = 127.5;

/// Number of distinct codes in the 12-bit corner encoding.
pub const CODE_STEPS: u32 = 4096;

/// Discrete 12-bit decoder for the game's second encoding generation
/// ("v2" recordings).
///
/// Each corner carries 3 bits, one per color channel thresholded at the
/// channel midpoint. Corners pack most-significant first in the order
/// top-left, top-right, bottom-left, bottom-right, and within a corner
/// the bits run red, green, blue. The quantized read survives codec
/// noise as long as every channel stays on its side of the threshold.
pub struct BinaryCodeDecoder;

impl BinaryCodeDecoder {
    fn pack_code(corners: &CornerColors) -> u32 {
        let mut code = 0u32;
        for corner in [
            corners.top_left,
            corners.top_right,
            corners.bottom_left,
            corners.bottom_right,
        ] {
            for channel in corner {
                code = (code << 1) | u32::from(channel >= CHANNEL_THRESHOLD);
            }
        }
        code
    }
}

impl AngleDecoder for BinaryCodeDecoder {
    fn decode(&self, corners: &CornerColors) -> f64 {
        let code = Self::pack_code(corners);
        // The game stores the rotation mirrored; undo it on the way out.
        -(f64::from(code) / f64::from(CODE_STEPS) * -360.0)
    }
}
