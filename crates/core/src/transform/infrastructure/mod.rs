pub mod cpu_rotator;
pub mod ring_overlay;
