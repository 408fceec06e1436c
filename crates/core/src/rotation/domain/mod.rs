pub mod angle_decoder;
pub mod corner_sampler;
