pub mod chunking;
pub mod pipeline;
pub mod rotation;
pub mod shared;
pub mod transform;
pub mod video;
