/// Offset of each corner sampling window from the frame edge, in pixels.
pub const CORNER_MARGIN: usize = 5;

/// Side length of each corner sampling window, in pixels.
pub const CORNER_WINDOW: usize = 3;

/// Upper clamp on the worker count. Process-wait APIs on Windows cap at
/// 64 handles minus coordinator bookkeeping, so the pool never exceeds 61.
pub const MAX_WORKERS: usize = 61;

/// Lower bound of the game's play-field aspect ratio (width / height).
/// Frames at least this wide carry the full play-field height; narrower
/// frames crop it, so the effective edge is derived from the width.
pub const PLAYFIELD_MIN_ASPECT: f64 = 1.7763;

/// Fitted ring-radius factor: radius = RING_RADIUS_FACTOR * edge / 2.
pub const RING_RADIUS_FACTOR: f64 = 1.5574;

/// Fitted ring-thickness coefficients: thickness = slope * edge + intercept.
/// Empirical fit against the game's rendered boundary, not geometry.
pub const RING_THICKNESS_SLOPE: f64 = 3.0 / 328.0;
pub const RING_THICKNESS_INTERCEPT: f64 = -46.0 / 41.0;

/// Container extensions with a known encoder mapping.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "wmv", "flv"];
