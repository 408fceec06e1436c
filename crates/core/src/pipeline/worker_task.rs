use std::path::PathBuf;

use crate::rotation::domain::angle_decoder::AngleDecoder;
use crate::rotation::domain::corner_sampler::CornerSampler;
use crate::rotation::infrastructure::decoder_factory::{self, AngleScheme};
use crate::shared::video_metadata::VideoMetadata;
use crate::transform::domain::frame_transformer::{FrameTransformer, TransformOptions};
use crate::transform::infrastructure::cpu_rotator::CpuRotator;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;
use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;

/// Progress event sent after each stabilized frame.
#[derive(Clone, Copy, Debug)]
pub struct WorkerProgress {
    pub worker_index: usize,
    pub frames_done: usize,
}

/// One worker's contiguous slice of the stabilization run.
///
/// A task is a plain value: it names its input slice and output part
/// file, and `run` builds every collaborator it needs from scratch.
/// Nothing is shared between workers, so tasks can execute on any
/// thread without coordination beyond the progress channel.
pub struct WorkerTask {
    pub worker_index: usize,
    pub source: PathBuf,
    pub output: PathBuf,
    pub start_frame: usize,
    pub frame_count: usize,
    pub scheme: AngleScheme,
    pub options: TransformOptions,
}

impl WorkerTask {
    /// Stabilizes this task's slice with its own ffmpeg reader and
    /// writer. Returns the number of frames written.
    pub fn run(
        &self,
        progress: &crossbeam_channel::Sender<WorkerProgress>,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        let decoder = decoder_factory::create_decoder(self.scheme);
        let transformer = CpuRotator::new(self.options);
        self.run_with(
            Box::new(FfmpegReader::new()),
            Box::new(FfmpegWriter::new()),
            decoder.as_ref(),
            &transformer,
            progress,
        )
    }

    /// Stabilizes this task's slice through the given collaborators.
    ///
    /// Unreadable frames are logged and skipped rather than failing the
    /// whole slice; a corrupted packet mid-recording should cost one
    /// frame, not the run.
    pub fn run_with(
        &self,
        mut reader: Box<dyn VideoReader>,
        mut writer: Box<dyn VideoWriter>,
        decoder: &dyn AngleDecoder,
        transformer: &dyn FrameTransformer,
        progress: &crossbeam_channel::Sender<WorkerProgress>,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        let metadata = reader.open(&self.source)?;

        let (out_width, out_height) = self.options.output_size(metadata.width, metadata.height);
        let out_metadata = VideoMetadata {
            width: out_width,
            height: out_height,
            fps: metadata.fps,
            total_frames: self.frame_count,
            codec: metadata.codec.clone(),
            source_path: Some(self.source.clone()),
        };
        writer.open(&self.output, &out_metadata)?;

        if self.start_frame > 0 {
            reader.seek(self.start_frame)?;
        }

        let sampler = CornerSampler::default();
        let mut written = 0usize;

        for result in reader.frames().take(self.frame_count) {
            match result {
                Ok(frame) => {
                    let angle = decoder.decode(&sampler.sample(&frame));
                    let stabilized = transformer.transform(&frame, angle);
                    writer.write(&stabilized)?;
                    written += 1;
                    let _ = progress.send(WorkerProgress {
                        worker_index: self.worker_index,
                        frames_done: written,
                    });
                }
                Err(e) => {
                    log::warn!(
                        "worker {}: skipping unreadable frame: {e}",
                        self.worker_index
                    );
                }
            }
        }

        reader.close();
        writer.close()?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::Frame;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    struct StubReader {
        frames: Vec<Result<Frame, String>>,
        seek_target: Arc<Mutex<Option<usize>>>,
        closed: Arc<Mutex<bool>>,
    }

    impl StubReader {
        fn new(frames: Vec<Result<Frame, String>>) -> Self {
            Self {
                frames,
                seek_target: Arc::new(Mutex::new(None)),
                closed: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl VideoReader for StubReader {
        fn open(&mut self, _path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            Ok(VideoMetadata {
                width: 40,
                height: 30,
                fps: 30.0,
                total_frames: self.frames.len(),
                codec: String::new(),
                source_path: None,
            })
        }

        fn seek(&mut self, frame_index: usize) -> Result<(), Box<dyn std::error::Error>> {
            *self.seek_target.lock().unwrap() = Some(frame_index);
            self.frames.drain(..frame_index.min(self.frames.len()));
            Ok(())
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new(
                self.frames
                    .drain(..)
                    .map(|r| r.map_err(|e| -> Box<dyn std::error::Error> { e.into() })),
            )
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    struct StubWriter {
        written: Arc<Mutex<Vec<Frame>>>,
        opened_size: Arc<Mutex<Option<(u32, u32)>>>,
    }

    impl StubWriter {
        fn new() -> Self {
            Self {
                written: Arc::new(Mutex::new(Vec::new())),
                opened_size: Arc::new(Mutex::new(None)),
            }
        }
    }

    impl VideoWriter for StubWriter {
        fn open(
            &mut self,
            _path: &Path,
            metadata: &VideoMetadata,
        ) -> Result<(), Box<dyn std::error::Error>> {
            *self.opened_size.lock().unwrap() = Some((metadata.width, metadata.height));
            Ok(())
        }

        fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.written.lock().unwrap().push(frame.clone());
            Ok(())
        }

        fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }
    }

    struct FixedAngleDecoder(f64);

    impl AngleDecoder for FixedAngleDecoder {
        fn decode(&self, _corners: &crate::rotation::domain::angle_decoder::CornerColors) -> f64 {
            self.0
        }
    }

    struct RecordingTransformer {
        angles: Arc<Mutex<Vec<f64>>>,
    }

    impl FrameTransformer for RecordingTransformer {
        fn transform(&self, frame: &Frame, angle_degrees: f64) -> Frame {
            self.angles.lock().unwrap().push(angle_degrees);
            frame.clone()
        }
    }

    fn make_frames(count: usize) -> Vec<Result<Frame, String>> {
        (0..count).map(|i| Ok(Frame::black(40, 30, i))).collect()
    }

    fn task(start: usize, count: usize) -> WorkerTask {
        WorkerTask {
            worker_index: 0,
            source: PathBuf::from("/tmp/in.mp4"),
            output: PathBuf::from("/tmp/part0.mp4"),
            start_frame: start,
            frame_count: count,
            scheme: AngleScheme::BinaryCode,
            options: TransformOptions::default(),
        }
    }

    #[test]
    fn test_writes_exactly_its_slice() {
        let writer = StubWriter::new();
        let written = writer.written.clone();
        let (tx, _rx) = crossbeam_channel::unbounded();

        let count = task(0, 4)
            .run_with(
                Box::new(StubReader::new(make_frames(10))),
                Box::new(writer),
                &FixedAngleDecoder(0.0),
                &RecordingTransformer {
                    angles: Arc::new(Mutex::new(Vec::new())),
                },
                &tx,
            )
            .unwrap();

        assert_eq!(count, 4);
        assert_eq!(written.lock().unwrap().len(), 4);
    }

    #[test]
    fn test_seeks_to_start_frame() {
        let reader = StubReader::new(make_frames(10));
        let seek_target = reader.seek_target.clone();
        let writer = StubWriter::new();
        let written = writer.written.clone();
        let (tx, _rx) = crossbeam_channel::unbounded();

        task(6, 4)
            .run_with(
                Box::new(reader),
                Box::new(writer),
                &FixedAngleDecoder(0.0),
                &RecordingTransformer {
                    angles: Arc::new(Mutex::new(Vec::new())),
                },
                &tx,
            )
            .unwrap();

        assert_eq!(*seek_target.lock().unwrap(), Some(6));
        let written = written.lock().unwrap();
        assert_eq!(written.len(), 4);
        assert_eq!(written[0].index(), 6);
    }

    #[test]
    fn test_decoded_angle_reaches_transformer() {
        let angles = Arc::new(Mutex::new(Vec::new()));
        let (tx, _rx) = crossbeam_channel::unbounded();

        task(0, 3)
            .run_with(
                Box::new(StubReader::new(make_frames(3))),
                Box::new(StubWriter::new()),
                &FixedAngleDecoder(42.5),
                &RecordingTransformer {
                    angles: angles.clone(),
                },
                &tx,
            )
            .unwrap();

        assert_eq!(&*angles.lock().unwrap(), &[42.5, 42.5, 42.5]);
    }

    #[test]
    fn test_unreadable_frame_skipped_not_fatal() {
        let mut frames = make_frames(2);
        frames.insert(1, Err("bad packet".to_string()));
        let writer = StubWriter::new();
        let written = writer.written.clone();
        let (tx, _rx) = crossbeam_channel::unbounded();

        let count = task(0, 3)
            .run_with(
                Box::new(StubReader::new(frames)),
                Box::new(writer),
                &FixedAngleDecoder(0.0),
                &RecordingTransformer {
                    angles: Arc::new(Mutex::new(Vec::new())),
                },
                &tx,
            )
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(written.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_writer_opened_with_expanded_canvas() {
        let writer = StubWriter::new();
        let opened = writer.opened_size.clone();
        let (tx, _rx) = crossbeam_channel::unbounded();

        let mut square_task = task(0, 1);
        square_task.options = TransformOptions {
            square: true,
            ring: None,
        };
        square_task
            .run_with(
                Box::new(StubReader::new(make_frames(1))),
                Box::new(writer),
                &FixedAngleDecoder(0.0),
                &CpuRotator::new(TransformOptions {
                    square: true,
                    ring: None,
                }),
                &tx,
            )
            .unwrap();

        // ceil(sqrt(40^2 + 30^2)) = 50
        assert_eq!(*opened.lock().unwrap(), Some((50, 50)));
    }

    #[test]
    fn test_progress_reported_per_frame() {
        let (tx, rx) = crossbeam_channel::unbounded();

        task(0, 5)
            .run_with(
                Box::new(StubReader::new(make_frames(5))),
                Box::new(StubWriter::new()),
                &FixedAngleDecoder(0.0),
                &RecordingTransformer {
                    angles: Arc::new(Mutex::new(Vec::new())),
                },
                &tx,
            )
            .unwrap();
        drop(tx);

        let events: Vec<_> = rx.iter().collect();
        assert_eq!(events.len(), 5);
        assert_eq!(events.last().unwrap().frames_done, 5);
    }

    #[test]
    fn test_closes_reader() {
        let reader = StubReader::new(make_frames(2));
        let closed = reader.closed.clone();
        let (tx, _rx) = crossbeam_channel::unbounded();

        task(0, 2)
            .run_with(
                Box::new(reader),
                Box::new(StubWriter::new()),
                &FixedAngleDecoder(0.0),
                &RecordingTransformer {
                    angles: Arc::new(Mutex::new(Vec::new())),
                },
                &tx,
            )
            .unwrap();

        assert!(*closed.lock().unwrap());
    }
}
