use crate::shared::constants::MAX_WORKERS;
use crate::shared::error::StabilizeError;

/// One worker's contiguous slice of the normalized source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk {
    /// Deterministic output ordering; strictly increasing in start frame.
    pub worker_index: usize,
    pub start_frame: usize,
    pub frame_count: usize,
}

/// Ordered, contiguous, non-overlapping chunk assignment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkPlan {
    chunks: Vec<Chunk>,
    total_frames: usize,
}

impl ChunkPlan {
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn worker_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn covered_frames(&self) -> usize {
        self.chunks.iter().map(|c| c.frame_count).sum()
    }

    /// Trailing frames not assigned to any chunk.
    pub fn dropped_frames(&self) -> usize {
        self.total_frames - self.covered_frames()
    }
}

/// Splits `total_frames` into equal chunks, one per worker.
///
/// Every chunk gets `total / workers` frames; the division remainder is
/// *not* redistributed, so up to `workers - 1` trailing frames go
/// unprocessed. That truncation matches the game-recording tooling this
/// replaces and is surfaced with a warning rather than silently fixed.
/// The worker count clamps to [`MAX_WORKERS`] and to the frame count so
/// no chunk is empty.
pub fn plan(total_frames: usize, worker_count: usize) -> Result<ChunkPlan, StabilizeError> {
    if worker_count == 0 {
        return Err(StabilizeError::InvalidWorkerCount);
    }

    let workers = worker_count.min(MAX_WORKERS).min(total_frames.max(1));
    let frame_count = total_frames / workers;

    let chunks = (0..workers)
        .map(|i| Chunk {
            worker_index: i,
            start_frame: i * frame_count,
            frame_count,
        })
        .collect();

    let plan = ChunkPlan {
        chunks,
        total_frames,
    };

    let dropped = plan.dropped_frames();
    if dropped > 0 {
        log::warn!(
            "chunk plan drops the last {dropped} of {total_frames} frames \
             ({workers} workers x {frame_count})"
        );
    }

    Ok(plan)
}
