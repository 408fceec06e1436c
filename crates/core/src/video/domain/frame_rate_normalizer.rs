use std::path::Path;

/// Re-times a source to constant frame spacing at a target rate.
///
/// The video stream is re-encoded with frames duplicated or dropped as
/// needed; audio packets are copied unmodified. Chunked parallel
/// processing depends on this: only on a CFR source does a frame index
/// map to a unique timestamp.
pub trait FrameRateNormalizer: Send {
    fn normalize(
        &self,
        source: &Path,
        target_fps: f64,
        output: &Path,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
