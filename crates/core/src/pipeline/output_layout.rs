use std::path::{Path, PathBuf};

/// Where one source's intermediate and final artifacts live.
///
/// Everything goes into a single output directory: per-worker part
/// files, the concat manifest, the rate-normalized temp copy, the
/// stabilized result, and the final remux with audio. Names are derived
/// from the source file name so runs over different recordings can
/// share a directory without colliding (part files are the exception;
/// one run per directory at a time).
#[derive(Clone, Debug)]
pub struct OutputLayout {
    dir: PathBuf,
    stem: String,
    extension: String,
}

impl OutputLayout {
    pub fn new(source: &Path, output_dir: &Path) -> Self {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("video")
            .to_string();
        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        Self {
            dir: output_dir.to_path_buf(),
            stem,
            extension,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Constant-frame-rate temp copy of the source.
    pub fn normalized(&self) -> PathBuf {
        self.dir
            .join(format!("{}_cfr{}", self.stem, self.extension))
    }

    /// One worker's output slice.
    pub fn part(&self, index: usize) -> PathBuf {
        self.dir.join(format!("part{index}{}", self.extension))
    }

    /// Concat manifest listing the parts in order.
    pub fn manifest(&self) -> PathBuf {
        self.dir.join("concat_list.txt")
    }

    /// Stabilized video, before audio is restored.
    pub fn stabilized(&self, square: bool) -> PathBuf {
        let tag = if square { "_square_stb" } else { "_stb" };
        self.dir.join(format!("{}{tag}{}", self.stem, self.extension))
    }

    /// Final result with the original audio muxed back in.
    pub fn with_audio(&self) -> PathBuf {
        self.dir
            .join(format!("{}_with_audio{}", self.stem, self.extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> OutputLayout {
        OutputLayout::new(Path::new("/videos/v1_take3.mp4"), Path::new("/out"))
    }

    #[test]
    fn test_normalized_name() {
        assert_eq!(layout().normalized(), Path::new("/out/v1_take3_cfr.mp4"));
    }

    #[test]
    fn test_part_names() {
        assert_eq!(layout().part(0), Path::new("/out/part0.mp4"));
        assert_eq!(layout().part(12), Path::new("/out/part12.mp4"));
    }

    #[test]
    fn test_manifest_name() {
        assert_eq!(layout().manifest(), Path::new("/out/concat_list.txt"));
    }

    #[test]
    fn test_stabilized_names() {
        assert_eq!(layout().stabilized(false), Path::new("/out/v1_take3_stb.mp4"));
        assert_eq!(
            layout().stabilized(true),
            Path::new("/out/v1_take3_square_stb.mp4")
        );
    }

    #[test]
    fn test_with_audio_name() {
        assert_eq!(
            layout().with_audio(),
            Path::new("/out/v1_take3_with_audio.mp4")
        );
    }

    #[test]
    fn test_extension_preserved() {
        let l = OutputLayout::new(Path::new("clip.mkv"), Path::new("out"));
        assert_eq!(l.stabilized(false), Path::new("out/clip_stb.mkv"));
    }
}
