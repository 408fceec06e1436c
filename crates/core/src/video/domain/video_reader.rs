use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Reads frames from a video source.
///
/// Implementations handle I/O details (codec, container format, seeking)
/// while workers operate on the abstract `Frame` and `VideoMetadata`
/// types. Call order is `open`, optionally `seek`, then `frames`.
pub trait VideoReader: Send {
    /// Opens a video file and returns its metadata.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Positions the next `frames` call at the given frame index.
    ///
    /// Only meaningful on a constant-frame-rate source, where frame
    /// index and timestamp are interchangeable.
    fn seek(&mut self, frame_index: usize) -> Result<(), Box<dyn std::error::Error>>;

    /// Returns an iterator over frames in decode order, starting at the
    /// last seek target (or the first frame). Frame indices are absolute
    /// positions in the stream.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases any resources held by the reader.
    fn close(&mut self);
}
