use ndarray::s;

use crate::shared::constants::{CORNER_MARGIN, CORNER_WINDOW};
use crate::shared::frame::Frame;

use super::angle_decoder::CornerColors;

/// Samples the mean color of a small window near each frame corner.
///
/// Near-edge windows start `margin` pixels in from their edge; far-edge
/// windows start `margin` pixels short of their edge. Both extend inward
/// by `window` pixels, matching where the game draws its rotation signal
/// (window must not exceed margin or the far windows would clip).
#[derive(Clone, Copy, Debug)]
pub struct CornerSampler {
    margin: usize,
    window: usize,
}

impl CornerSampler {
    pub fn new(margin: usize, window: usize) -> Self {
        Self {
            margin,
            window: window.max(1).min(margin.max(1)),
        }
    }

    pub fn sample(&self, frame: &Frame) -> CornerColors {
        let h = frame.height() as usize;
        let w = frame.width() as usize;

        let s = self.window.min(h).min(w);
        let m = self.margin.min(h.saturating_sub(s)).min(w.saturating_sub(s));

        let top = m;
        let left = m;
        let bottom = h - m; // window spans [h - m, h - m + s), s <= m
        let right = w - m;

        CornerColors {
            top_left: window_mean(frame, top, left, s),
            top_right: window_mean(frame, top, right, s),
            bottom_left: window_mean(frame, bottom, left, s),
            bottom_right: window_mean(frame, bottom, right, s),
        }
    }
}

impl Default for CornerSampler {
    fn default() -> Self {
        Self::new(CORNER_MARGIN, CORNER_WINDOW)
    }
}

fn window_mean(frame: &Frame, row: usize, col: usize, side: usize) -> [f64; 3] {
    let h = frame.height() as usize;
    let w = frame.width() as usize;
    let row = row.min(h - side);
    let col = col.min(w - side);

    let view = frame.as_ndarray();
    let window = view.slice(s![row..row + side, col..col + side, ..]);
    let count = (side * side) as f64;

    let mut mean = [0.0f64; 3];
    for ch in 0..3 {
        let sum: f64 = window.slice(s![.., .., ch]).iter().map(|&v| v as f64).sum();
        mean[ch] = sum / count;
    }
    mean
}
