use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::chunking::chunk_planner;
use crate::rotation::infrastructure::decoder_factory::AngleScheme;
use crate::shared::error::StabilizeError;
use crate::transform::domain::frame_transformer::TransformOptions;
use crate::video::domain::audio_muxer::AudioMuxer;
use crate::video::domain::frame_rate_normalizer::FrameRateNormalizer;
use crate::video::domain::stream_concatenator::StreamConcatenator;
use crate::video::domain::video_reader::VideoReader;
use crate::video::infrastructure::codec_map;

use super::output_layout::OutputLayout;
use super::pipeline_logger::PipelineLogger;
use super::worker_executor::WorkerExecutor;
use super::worker_task::WorkerTask;

/// What one stabilization run should do.
#[derive(Clone, Copy, Debug)]
pub struct StabilizeOptions {
    pub scheme: AngleScheme,
    pub transform: TransformOptions,
    pub worker_count: usize,
    pub target_fps: f64,
}

/// Orchestrates the full stabilization pipeline for one recording.
///
/// Stages run in a fixed order: normalize the source to constant frame
/// rate, split it into chunks, counter-rotate each chunk on its own
/// worker, join the parts, and mux the original audio back in.
/// Intermediates are deleted on success; the final artifact is the
/// `_with_audio` file.
///
/// This is a single-use struct: `execute` consumes the owned
/// collaborators, so calling it twice will fail.
pub struct StabilizeVideoUseCase {
    reader: Option<Box<dyn VideoReader>>,
    normalizer: Option<Box<dyn FrameRateNormalizer>>,
    concatenator: Option<Box<dyn StreamConcatenator>>,
    muxer: Option<Box<dyn AudioMuxer>>,
    executor: Box<dyn WorkerExecutor>,
    logger: Box<dyn PipelineLogger>,
    options: StabilizeOptions,
}

impl StabilizeVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        normalizer: Box<dyn FrameRateNormalizer>,
        concatenator: Box<dyn StreamConcatenator>,
        muxer: Box<dyn AudioMuxer>,
        executor: Box<dyn WorkerExecutor>,
        logger: Box<dyn PipelineLogger>,
        options: StabilizeOptions,
    ) -> Self {
        Self {
            reader: Some(reader),
            normalizer: Some(normalizer),
            concatenator: Some(concatenator),
            muxer: Some(muxer),
            executor,
            logger,
            options,
        }
    }

    /// Runs the pipeline and returns the path of the final output.
    pub fn execute(
        &mut self,
        source: &Path,
        output_dir: &Path,
    ) -> Result<PathBuf, StabilizeError> {
        // The extension decides the intermediate codec, so reject
        // unmapped containers before any work happens.
        codec_for_source(source)?;

        std::fs::create_dir_all(output_dir)?;
        let layout = OutputLayout::new(source, output_dir);

        let normalizer = self
            .normalizer
            .take()
            .ok_or_else(already_executed)?;
        let reader = self.reader.take().ok_or_else(already_executed)?;
        let concatenator = self.concatenator.take().ok_or_else(already_executed)?;
        let muxer = self.muxer.take().ok_or_else(already_executed)?;

        let normalized = layout.normalized();
        self.logger.info(&format!(
            "normalizing {} to {:.0} fps",
            source.display(),
            self.options.target_fps
        ));
        let started = Instant::now();
        normalizer
            .normalize(source, self.options.target_fps, &normalized)
            .map_err(|e| StabilizeError::collaborator("normalize", source, e))?;
        self.logger
            .timing("normalize", started.elapsed().as_secs_f64() * 1000.0);

        let metadata = self.probe(reader, &normalized)?;
        let plan = chunk_planner::plan(metadata.total_frames, self.options.worker_count)?;

        let tasks: Vec<WorkerTask> = plan
            .chunks()
            .iter()
            .map(|chunk| WorkerTask {
                worker_index: chunk.worker_index,
                source: normalized.clone(),
                output: layout.part(chunk.worker_index),
                start_frame: chunk.start_frame,
                frame_count: chunk.frame_count,
                scheme: self.options.scheme,
                options: self.options.transform,
            })
            .collect();
        let parts: Vec<PathBuf> = tasks.iter().map(|t| t.output.clone()).collect();

        self.logger.info(&format!(
            "stabilizing {} frames across {} workers",
            plan.covered_frames(),
            plan.worker_count()
        ));
        let started = Instant::now();
        let logger = &mut self.logger;
        self.executor.execute(
            tasks,
            plan.covered_frames(),
            &mut |done, total| logger.progress(done, total),
        )?;
        self.logger
            .timing("stabilize", started.elapsed().as_secs_f64() * 1000.0);

        let stabilized = layout.stabilized(self.options.transform.square);
        let started = Instant::now();
        concatenator
            .concatenate(&parts, &layout.manifest(), &stabilized)
            .map_err(|e| StabilizeError::collaborator("concatenate", &stabilized, e))?;
        self.logger
            .timing("concatenate", started.elapsed().as_secs_f64() * 1000.0);

        let with_audio = layout.with_audio();
        let started = Instant::now();
        muxer
            .mux(&stabilized, source, &with_audio)
            .map_err(|e| StabilizeError::collaborator("mux", &with_audio, e))?;
        self.logger
            .timing("mux", started.elapsed().as_secs_f64() * 1000.0);

        cleanup_intermediates(&parts, &layout);
        self.logger
            .info(&format!("wrote {}", with_audio.display()));
        self.logger.summary();

        Ok(with_audio)
    }

    fn probe(
        &mut self,
        mut reader: Box<dyn VideoReader>,
        normalized: &Path,
    ) -> Result<crate::shared::video_metadata::VideoMetadata, StabilizeError> {
        let metadata = reader
            .open(normalized)
            .map_err(|e| StabilizeError::collaborator("probe", normalized, e))?;
        reader.close();
        Ok(metadata)
    }
}

fn codec_for_source(source: &Path) -> Result<(), StabilizeError> {
    codec_map::codec_for_path(source).map(|_| ())
}

fn already_executed() -> StabilizeError {
    StabilizeError::Collaborator {
        stage: "execute",
        path: PathBuf::new(),
        message: "pipeline already executed".to_string(),
    }
}

/// Parts, manifest, and the normalized temp copy are only useful while
/// the run is in flight. Failure to delete them is not worth failing a
/// finished run over.
fn cleanup_intermediates(parts: &[PathBuf], layout: &OutputLayout) {
    for path in parts
        .iter()
        .chain([layout.manifest(), layout.normalized()].iter())
    {
        if let Err(e) = std::fs::remove_file(path) {
            log::warn!("could not remove {}: {e}", path.display());
        }
    }
}
