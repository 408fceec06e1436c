pub mod frame_transformer;
