/// Mean RGB color of the four corner sampling windows of one frame.
///
/// The game renders its current rotation into these corners every frame,
/// so the samples are never reused across frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerColors {
    pub top_left: [f64; 3],
    pub top_right: [f64; 3],
    pub bottom_left: [f64; 3],
    pub bottom_right: [f64; 3],
}

/// Decodes the play-field rotation angle from the corner colors.
///
/// Implementations cover the two known corner-encoding generations of the
/// game. The returned value is in degrees, already sign-adjusted so that
/// passing it straight to the frame transformer counter-rotates the frame.
pub trait AngleDecoder: Send {
    fn decode(&self, corners: &CornerColors) -> f64;
}

/// Euclidean distance between two RGB colors.
pub(crate) fn color_distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    (dr * dr + dg * dg + db * db).sqrt()
}
