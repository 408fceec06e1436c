use std::path::Path;

/// Container duration in seconds, from the format header.
pub fn duration_seconds(path: &Path) -> Result<f64, Box<dyn std::error::Error>> {
    ffmpeg_next::init()?;
    let ictx = ffmpeg_next::format::input(path)?;
    let duration = ictx.duration();
    if duration <= 0 {
        return Err(format!("{} reports no duration", path.display()).into());
    }
    Ok(duration as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE))
}
