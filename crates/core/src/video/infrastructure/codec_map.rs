use std::path::Path;

use crate::shared::error::StabilizeError;

/// Fixed extension → encoder mapping.
///
/// Intermediate artifacts keep the input's container, so every supported
/// extension needs one known-good encoder. An unmapped extension is a
/// configuration error raised before any processing starts — there is no
/// runtime fallback.
pub fn codec_for_path(path: &Path) -> Result<ffmpeg_next::codec::Id, StabilizeError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "mp4" | "mov" | "avi" => Ok(ffmpeg_next::codec::Id::MPEG4),
        "mkv" => Ok(ffmpeg_next::codec::Id::H264),
        "wmv" => Ok(ffmpeg_next::codec::Id::WMV2),
        "flv" => Ok(ffmpeg_next::codec::Id::FLV1),
        _ => Err(StabilizeError::UnsupportedExtension {
            extension,
            path: path.to_path_buf(),
        }),
    }
}
