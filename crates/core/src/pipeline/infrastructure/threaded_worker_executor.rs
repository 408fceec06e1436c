use crate::pipeline::worker_executor::WorkerExecutor;
use crate::pipeline::worker_task::{WorkerProgress, WorkerTask};
use crate::shared::error::StabilizeError;

/// Executes worker tasks on one OS thread each.
///
/// Every task opens its own decoder and encoder, so the threads share
/// nothing but the progress channel; ffmpeg contexts never cross a
/// thread boundary. The calling thread drains progress events while the
/// workers run, then joins them in task order.
pub struct ThreadedWorkerExecutor;

impl ThreadedWorkerExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ThreadedWorkerExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerExecutor for ThreadedWorkerExecutor {
    fn execute(
        &self,
        tasks: Vec<WorkerTask>,
        planned_frames: usize,
        on_progress: &mut dyn FnMut(usize, usize),
    ) -> Result<usize, StabilizeError> {
        let (progress_tx, progress_rx) = crossbeam_channel::unbounded::<WorkerProgress>();

        let handles: Vec<_> = tasks
            .into_iter()
            .map(|task| {
                let tx = progress_tx.clone();
                let index = task.worker_index;
                let handle =
                    std::thread::spawn(move || task.run(&tx).map_err(|e| e.to_string()));
                (index, handle)
            })
            .collect();
        drop(progress_tx);

        // Workers report frames done so far; sum the latest value from
        // each to get the overall position.
        let mut per_worker = std::collections::HashMap::new();
        for event in progress_rx {
            per_worker.insert(event.worker_index, event.frames_done);
            let done: usize = per_worker.values().sum();
            on_progress(done, planned_frames);
        }

        let mut total_written = 0usize;
        for (index, handle) in handles {
            let result = handle.join().map_err(|_| StabilizeError::Worker {
                index,
                message: "worker thread panicked".to_string(),
            })?;
            total_written += result.map_err(|message| StabilizeError::Worker { index, message })?;
        }

        Ok(total_written)
    }
}
