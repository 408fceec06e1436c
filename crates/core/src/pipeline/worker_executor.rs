use crate::shared::error::StabilizeError;

use super::worker_task::WorkerTask;

/// Runs a batch of worker tasks to completion.
///
/// Implementations own the execution strategy (threads, in-line for
/// tests) while the use case owns what the tasks do. `on_progress`
/// receives the running total of stabilized frames against the planned
/// total.
pub trait WorkerExecutor {
    fn execute(
        &self,
        tasks: Vec<WorkerTask>,
        planned_frames: usize,
        on_progress: &mut dyn FnMut(usize, usize),
    ) -> Result<usize, StabilizeError>;
}
