use crate::shared::constants::{
    PLAYFIELD_MIN_ASPECT, RING_RADIUS_FACTOR, RING_THICKNESS_INTERCEPT, RING_THICKNESS_SLOPE,
};
use crate::shared::frame::Frame;

/// Boundary-ring compositing parameters.
///
/// Radius and thickness are affine functions of the effective play-field
/// edge, fitted against the game's own rendering. They are configuration,
/// not geometry; adjust them if the game changes its boundary art.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingOptions {
    pub color: [u8; 3],
    pub radius_factor: f64,
    pub thickness_slope: f64,
    pub thickness_intercept: f64,
    /// Max channel value at or below which a rotated pixel counts as
    /// exposed background rather than frame content.
    pub mask_threshold: u8,
}

impl Default for RingOptions {
    fn default() -> Self {
        Self {
            color: [128, 128, 128],
            radius_factor: RING_RADIUS_FACTOR,
            thickness_slope: RING_THICKNESS_SLOPE,
            thickness_intercept: RING_THICKNESS_INTERCEPT,
            mask_threshold: 10,
        }
    }
}

/// How each frame is counter-rotated.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransformOptions {
    /// Expand to the minimal square canvas bounding any rotation of the
    /// source instead of rotating in place.
    pub square: bool,
    /// Draw the play-field boundary ring behind the rotated frame.
    /// Only meaningful in square mode.
    pub ring: Option<RingOptions>,
}

impl TransformOptions {
    /// Side of the minimal square that bounds every rotation of a
    /// width × height rectangle.
    pub fn square_side(width: u32, height: u32) -> u32 {
        let w = f64::from(width);
        let h = f64::from(height);
        (w * w + h * h).sqrt().ceil() as u32
    }

    /// Output dimensions for a source of the given size.
    pub fn output_size(&self, width: u32, height: u32) -> (u32, u32) {
        if self.square {
            let side = Self::square_side(width, height);
            (side, side)
        } else {
            (width, height)
        }
    }

    /// Effective play-field edge length for ring geometry. Wide frames
    /// carry the full play-field height; narrower ones crop it.
    pub fn effective_edge(width: u32, height: u32) -> f64 {
        let w = f64::from(width);
        let h = f64::from(height);
        if w / h >= PLAYFIELD_MIN_ASPECT {
            h
        } else {
            w / PLAYFIELD_MIN_ASPECT
        }
    }
}

/// Applies the inverse play-field rotation to one frame.
///
/// Positive angles rotate counter-clockwise, matching the decoder's sign
/// convention. The output frame keeps the input's stream index.
pub trait FrameTransformer: Send {
    fn transform(&self, frame: &Frame, angle_degrees: f64) -> Frame;
}
