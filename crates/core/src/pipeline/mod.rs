pub mod infrastructure;
pub mod output_layout;
pub mod pipeline_logger;
pub mod stabilize_video_use_case;
pub mod worker_executor;
pub mod worker_task;
