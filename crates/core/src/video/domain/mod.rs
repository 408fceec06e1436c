pub mod audio_muxer;
pub mod frame_rate_normalizer;
pub mod stream_concatenator;
pub mod video_reader;
pub mod video_writer;
