use std::path::PathBuf;

use thiserror::Error;

/// Fatal pipeline errors. Per-frame read failures and degenerate corner
/// colors are absorbed locally with a warning and never reach this type.
#[derive(Error, Debug)]
pub enum StabilizeError {
    #[error("no encoder mapping for extension {extension:?} of {path}")]
    UnsupportedExtension { extension: String, path: PathBuf },

    #[error("worker count must be at least 1")]
    InvalidWorkerCount,

    #[error("{stage} failed for {path}: {message}")]
    Collaborator {
        stage: &'static str,
        path: PathBuf,
        message: String,
    },

    #[error("worker {index} failed: {message}")]
    Worker { index: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StabilizeError {
    pub fn collaborator(
        stage: &'static str,
        path: &std::path::Path,
        err: Box<dyn std::error::Error>,
    ) -> Self {
        Self::Collaborator {
            stage,
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_unsupported_extension_message_names_both() {
        let err = StabilizeError::UnsupportedExtension {
            extension: "webm".to_string(),
            path: PathBuf::from("clip.webm"),
        };
        let msg = err.to_string();
        assert!(msg.contains("webm"));
        assert!(msg.contains("clip.webm"));
    }

    #[test]
    fn test_collaborator_wraps_boxed_error() {
        let inner: Box<dyn std::error::Error> = "demuxer exploded".into();
        let err = StabilizeError::collaborator("concatenate", Path::new("/tmp/x.mp4"), inner);
        let msg = err.to_string();
        assert!(msg.contains("concatenate"));
        assert!(msg.contains("demuxer exploded"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: StabilizeError = io.into();
        assert!(matches!(err, StabilizeError::Io(_)));
    }
}
