pub mod analog_decoder;
pub mod binary_decoder;
pub mod decoder_factory;
