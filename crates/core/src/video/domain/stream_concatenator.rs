use std::path::{Path, PathBuf};

/// Joins same-codec video files into one by direct stream copy.
///
/// A manifest file listing the inputs in order, one per line, is written
/// next to the output for traceability; the copy itself never re-encodes.
pub trait StreamConcatenator: Send {
    fn concatenate(
        &self,
        parts: &[PathBuf],
        manifest: &Path,
        output: &Path,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
