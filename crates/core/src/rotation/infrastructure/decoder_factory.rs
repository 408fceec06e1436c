use crate::rotation::domain::angle_decoder::AngleDecoder;

use super::analog_decoder::AnalogDistanceDecoder;
use super::binary_decoder::BinaryCodeDecoder;

/// Corner-encoding generation of the recording.
///
/// Selected explicitly by the caller; both schemes decode *something*
/// plausible from the wrong input, so no auto-detection is attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AngleScheme {
    /// First-generation analog gradient encoding ("v1" recordings).
    AnalogDistance,
    /// Second-generation 12-bit corner encoding.
    BinaryCode,
}

pub fn create_decoder(scheme: AngleScheme) -> Box<dyn AngleDecoder> {
    match scheme {
        AngleScheme::AnalogDistance => Box::new(AnalogDistanceDecoder),
        AngleScheme::BinaryCode => Box::new(BinaryCodeDecoder),
    }
}
