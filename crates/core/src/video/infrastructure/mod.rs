pub mod codec_map;
pub mod ffmpeg_audio_muxer;
pub mod ffmpeg_concatenator;
pub mod ffmpeg_normalizer;
pub mod ffmpeg_probe;
pub mod ffmpeg_reader;
pub mod ffmpeg_writer;

#[cfg(test)]
pub mod test_support;
