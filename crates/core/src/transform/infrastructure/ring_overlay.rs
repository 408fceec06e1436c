use crate::shared::frame::Frame;
use crate::transform::domain::frame_transformer::{RingOptions, TransformOptions};

/// Ring radius in pixels for a source frame of the given size.
pub fn ring_radius(src_width: u32, src_height: u32, options: &RingOptions) -> f64 {
    let edge = TransformOptions::effective_edge(src_width, src_height);
    options.radius_factor * edge / 2.0
}

/// Ring stroke thickness in pixels, never below one.
pub fn ring_thickness(src_width: u32, src_height: u32, options: &RingOptions) -> f64 {
    let edge = TransformOptions::effective_edge(src_width, src_height);
    let fitted = (options.thickness_slope * edge + options.thickness_intercept).round();
    fitted.max(1.0)
}

/// Draws the rotated frame over a fresh canvas carrying the boundary
/// ring, so the ring shows wherever the rotation exposed background.
///
/// Near-black rotated pixels are treated as exposed background: the
/// rotation fill is black, and the game renders nothing that dark
/// inside the play field's visible area.
pub fn composite_over_ring(
    rotated: &Frame,
    src_width: u32,
    src_height: u32,
    options: &RingOptions,
) -> Frame {
    let mut canvas = Frame::black(rotated.width(), rotated.height(), rotated.index());
    draw_ring(
        &mut canvas,
        ring_radius(src_width, src_height, options),
        ring_thickness(src_width, src_height, options),
        options.color,
    );

    let threshold = options.mask_threshold;
    let dst = canvas.data_mut();
    let src = rotated.data();
    for (dst_px, src_px) in dst.chunks_exact_mut(3).zip(src.chunks_exact(3)) {
        if src_px.iter().any(|&v| v > threshold) {
            dst_px.copy_from_slice(src_px);
        }
    }

    canvas
}

/// Strokes a circle of the given radius and thickness about the canvas
/// center.
fn draw_ring(canvas: &mut Frame, radius: f64, thickness: f64, color: [u8; 3]) {
    let w = canvas.width() as i64;
    let h = canvas.height() as i64;
    let cx = canvas.width() as f64 / 2.0;
    let cy = canvas.height() as f64 / 2.0;
    let half = thickness / 2.0;
    let outer = radius + half;
    let inner = radius - half;

    let y_min = ((cy - outer).floor() as i64).max(0);
    let y_max = ((cy + outer).ceil() as i64).min(h - 1);
    let x_min = ((cx - outer).floor() as i64).max(0);
    let x_max = ((cx + outer).ceil() as i64).min(w - 1);

    for y in y_min..=y_max {
        let dy = (y as f64 + 0.5) - cy;
        for x in x_min..=x_max {
            let dx = (x as f64 + 0.5) - cx;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist >= inner && dist <= outer {
                canvas.set_pixel(x as u32, y as u32, color);
            }
        }
    }
}
