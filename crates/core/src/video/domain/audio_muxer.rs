use std::path::Path;

/// Muxes the audio track of one file onto the video stream of another.
///
/// The video stream is copied bit-exact; the audio track ends up AAC,
/// copied when it already is and re-encoded otherwise. A source with
/// no audio stream is not an error: the video is passed through alone.
pub trait AudioMuxer: Send {
    fn mux(
        &self,
        video_source: &Path,
        audio_source: &Path,
        output: &Path,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
