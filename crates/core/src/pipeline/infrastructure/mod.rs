pub mod threaded_worker_executor;
