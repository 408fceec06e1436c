use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use rotastab_core::pipeline::infrastructure::threaded_worker_executor::ThreadedWorkerExecutor;
use rotastab_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use rotastab_core::pipeline::stabilize_video_use_case::{StabilizeOptions, StabilizeVideoUseCase};
use rotastab_core::rotation::infrastructure::decoder_factory::AngleScheme;
use rotastab_core::shared::constants::VIDEO_EXTENSIONS;
use rotastab_core::transform::domain::frame_transformer::{RingOptions, TransformOptions};
use rotastab_core::video::infrastructure::ffmpeg_audio_muxer::FfmpegAudioMuxer;
use rotastab_core::video::infrastructure::ffmpeg_probe;
use rotastab_core::video::infrastructure::ffmpeg_concatenator::FfmpegStreamConcatenator;
use rotastab_core::video::infrastructure::ffmpeg_normalizer::FfmpegFrameRateNormalizer;
use rotastab_core::video::infrastructure::ffmpeg_reader::FfmpegReader;

/// De-rotation for screen recordings of rotating-play-field rhythm games.
#[derive(Parser)]
#[command(name = "rotastab")]
struct Cli {
    /// Input video file, or a directory to process in batch.
    input: PathBuf,

    /// Directory for intermediate and final artifacts.
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Rotation encoding: analog or binary. Defaults per file: analog
    /// for recordings whose name starts with "v1", binary otherwise.
    #[arg(long)]
    scheme: Option<String>,

    /// Expand each frame onto the square canvas that bounds every
    /// rotation, instead of rotating in place.
    #[arg(long)]
    square: bool,

    /// Draw the play-field boundary ring behind the rotated frame.
    /// Implies --square.
    #[arg(long)]
    ring: bool,

    /// Worker threads. Defaults to the available parallelism; clamped
    /// to 61 and to the frame count.
    #[arg(long)]
    workers: Option<usize>,

    /// Constant frame rate the source is normalized to before chunking.
    #[arg(long, default_value = "60")]
    fps: f64,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let videos = discover_videos(&cli.input)?;
    if videos.is_empty() {
        return Err(format!("no video files found in {}", cli.input.display()).into());
    }

    let mut failures = 0usize;
    for video in &videos {
        match ffmpeg_probe::duration_seconds(video) {
            Ok(seconds) => log::info!("Processing {} ({seconds:.1}s)", video.display()),
            Err(_) => log::info!("Processing {}", video.display()),
        }
        if let Err(e) = stabilize(&cli, video) {
            log::error!("{} failed: {e}", video.display());
            failures += 1;
        }
    }

    if failures > 0 {
        return Err(format!("{failures} of {} videos failed", videos.len()).into());
    }
    Ok(())
}

fn stabilize(cli: &Cli, video: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let options = StabilizeOptions {
        scheme: scheme_for(cli, video)?,
        transform: TransformOptions {
            square: cli.square || cli.ring,
            ring: cli.ring.then(RingOptions::default),
        },
        worker_count: cli.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }),
        target_fps: cli.fps,
    };

    let mut use_case = StabilizeVideoUseCase::new(
        Box::new(FfmpegReader::new()),
        Box::new(FfmpegFrameRateNormalizer),
        Box::new(FfmpegStreamConcatenator),
        Box::new(FfmpegAudioMuxer),
        Box::new(ThreadedWorkerExecutor::new()),
        Box::new(StdoutPipelineLogger::default()),
        options,
    );

    let output = use_case.execute(video, &cli.output_dir)?;
    log::info!("Output written to {}", output.display());
    Ok(())
}

/// Early recordings (file names starting with "v1") carry the analog
/// distance encoding; everything newer uses the binary corner code.
fn scheme_for(cli: &Cli, video: &Path) -> Result<AngleScheme, Box<dyn std::error::Error>> {
    if let Some(scheme) = &cli.scheme {
        return match scheme.as_str() {
            "analog" => Ok(AngleScheme::AnalogDistance),
            "binary" => Ok(AngleScheme::BinaryCode),
            other => Err(format!("Scheme must be 'analog' or 'binary', got '{other}'").into()),
        };
    }

    let name = video
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if name.starts_with("v1") {
        Ok(AngleScheme::AnalogDistance)
    } else {
        Ok(AngleScheme::BinaryCode)
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input not found: {}", cli.input.display()).into());
    }
    if cli.workers == Some(0) {
        return Err("Workers must be at least 1".into());
    }
    if cli.fps <= 0.0 {
        return Err(format!("Frame rate must be positive, got {}", cli.fps).into());
    }
    if let Some(scheme) = &cli.scheme {
        if scheme != "analog" && scheme != "binary" {
            return Err(format!("Scheme must be 'analog' or 'binary', got '{scheme}'").into());
        }
    }
    Ok(())
}

fn discover_videos(input: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut videos: Vec<PathBuf> = std::fs::read_dir(input)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_video(path))
        .collect();
    videos.sort();
    Ok(videos)
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
