use crate::shared::frame::Frame;
use crate::transform::domain::frame_transformer::{FrameTransformer, TransformOptions};

use super::ring_overlay;

/// CPU rotator using inverse-mapped bilinear resampling.
///
/// Each output pixel is mapped back into the source by the inverse
/// rotation and sampled bilinearly; pixels mapping outside the source
/// stay black. Rotation is about the canvas center, positive angles
/// counter-clockwise.
pub struct CpuRotator {
    options: TransformOptions,
}

impl CpuRotator {
    pub fn new(options: TransformOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }
}

impl FrameTransformer for CpuRotator {
    fn transform(&self, frame: &Frame, angle_degrees: f64) -> Frame {
        if !self.options.square {
            return rotate_about_center(frame, angle_degrees);
        }

        let side = TransformOptions::square_side(frame.width(), frame.height());
        let padded = paste_centered(frame, side);
        let rotated = rotate_about_center(&padded, angle_degrees);

        match &self.options.ring {
            Some(ring) => {
                ring_overlay::composite_over_ring(&rotated, frame.width(), frame.height(), ring)
            }
            None => rotated,
        }
    }
}

/// Rotates a frame about its own center, output dimensions unchanged.
fn rotate_about_center(src: &Frame, angle_degrees: f64) -> Frame {
    let w = src.width() as usize;
    let h = src.height() as usize;
    let mut dst = Frame::black(src.width(), src.height(), src.index());

    let theta = angle_degrees.to_radians();
    let (sin_t, cos_t) = theta.sin_cos();
    let cx = src.width() as f64 / 2.0;
    let cy = src.height() as f64 / 2.0;

    let src_data = src.data();
    let dst_data = dst.data_mut();

    for y in 0..h {
        let dy = y as f64 - cy;
        for x in 0..w {
            let dx = x as f64 - cx;
            // Inverse rotation: where in the source this pixel came from.
            let sx = cos_t * dx - sin_t * dy + cx;
            let sy = sin_t * dx + cos_t * dy + cy;

            if let Some(rgb) = sample_bilinear(src_data, w, h, sx, sy) {
                let off = (y * w + x) * 3;
                dst_data[off..off + 3].copy_from_slice(&rgb);
            }
        }
    }

    dst
}

/// Bilinear sample at a fractional source position; `None` when every
/// contributing pixel lies outside the frame.
fn sample_bilinear(data: &[u8], w: usize, h: usize, sx: f64, sy: f64) -> Option<[u8; 3]> {
    if sx <= -1.0 || sy <= -1.0 || sx >= w as f64 || sy >= h as f64 {
        return None;
    }

    let x0 = sx.floor();
    let y0 = sy.floor();
    let fx = sx - x0;
    let fy = sy - y0;
    let x0 = x0 as i64;
    let y0 = y0 as i64;

    let mut acc = [0.0f64; 3];
    let mut weight_in = 0.0;
    for (gy, wy) in [(y0, 1.0 - fy), (y0 + 1, fy)] {
        for (gx, wx) in [(x0, 1.0 - fx), (x0 + 1, fx)] {
            let wgt = wx * wy;
            if wgt == 0.0 {
                continue;
            }
            if gx < 0 || gy < 0 || gx >= w as i64 || gy >= h as i64 {
                continue; // contributes black
            }
            let off = (gy as usize * w + gx as usize) * 3;
            acc[0] += f64::from(data[off]) * wgt;
            acc[1] += f64::from(data[off + 1]) * wgt;
            acc[2] += f64::from(data[off + 2]) * wgt;
            weight_in += wgt;
        }
    }

    if weight_in == 0.0 {
        return None;
    }
    Some([
        acc[0].round().clamp(0.0, 255.0) as u8,
        acc[1].round().clamp(0.0, 255.0) as u8,
        acc[2].round().clamp(0.0, 255.0) as u8,
    ])
}

/// Pastes `src` centered on a black `side`×`side` canvas, offsets floored.
fn paste_centered(src: &Frame, side: u32) -> Frame {
    let mut canvas = Frame::black(side, side, src.index());
    let ox = ((side - src.width()) / 2) as usize;
    let oy = ((side - src.height()) / 2) as usize;

    let w = src.width() as usize;
    let h = src.height() as usize;
    let stride = side as usize * 3;
    let src_data = src.data();
    let dst_data = canvas.data_mut();

    for row in 0..h {
        let src_off = row * w * 3;
        let dst_off = (oy + row) * stride + ox * 3;
        dst_data[dst_off..dst_off + w * 3].copy_from_slice(&src_data[src_off..src_off + w * 3]);
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::domain::frame_transformer::RingOptions;

    fn gradient_frame(w: u32, h: u32) -> Frame {
        let mut frame = Frame::black(w, h, 3);
        for y in 0..h {
            for x in 0..w {
                frame.set_pixel(x, y, [(x * 7 % 256) as u8, (y * 11 % 256) as u8, 90]);
            }
        }
        frame
    }

    #[test]
    fn test_zero_angle_in_place_is_identity() {
        let frame = gradient_frame(32, 20);
        let rotator = CpuRotator::new(TransformOptions::default());
        let out = rotator.transform(&frame, 0.0);
        assert_eq!(out.width(), 32);
        assert_eq!(out.height(), 20);
        assert_eq!(out.data(), frame.data());
    }

    #[test]
    fn test_output_keeps_frame_index() {
        let frame = gradient_frame(16, 16);
        let rotator = CpuRotator::new(TransformOptions::default());
        assert_eq!(rotator.transform(&frame, 33.0).index(), 3);
    }

    #[test]
    fn test_square_mode_output_is_bounding_square() {
        let frame = gradient_frame(100, 100);
        let rotator = CpuRotator::new(TransformOptions {
            square: true,
            ring: None,
        });
        for angle in [0.0, 17.5, 90.0, 245.0] {
            let out = rotator.transform(&frame, angle);
            let min_side = TransformOptions::square_side(100, 100);
            assert!(out.width() >= min_side);
            assert!(out.height() >= min_side);
            assert_eq!(out.width(), out.height());
        }
    }

    #[test]
    fn test_square_mode_preserves_content_at_any_angle() {
        // Nothing may clip: the pixel mass of a bright frame survives
        // rotation onto the square canvas (interpolation aside).
        let frame = Frame::new(vec![255u8; 40 * 20 * 3], 40, 20, 0);
        let rotator = CpuRotator::new(TransformOptions {
            square: true,
            ring: None,
        });
        let out = rotator.transform(&frame, 31.0);
        let lit: usize = out.data().iter().filter(|&&v| v > 200).count();
        // 40*20 source pixels, 3 channels, allow edge losses.
        assert!(lit > 40 * 20 * 3 * 9 / 10, "lit = {lit}");
    }

    #[test]
    fn test_in_place_rotation_discards_clipped_corners() {
        // Rotating a wide bright frame in place pushes its corners out.
        let frame = Frame::new(vec![255u8; 40 * 10 * 3], 40, 10, 0);
        let rotator = CpuRotator::new(TransformOptions::default());
        let out = rotator.transform(&frame, 90.0);
        let dark: usize = out.data().iter().filter(|&&v| v < 50).count();
        assert!(dark > 0, "expected exposed black after in-place rotation");
    }

    #[test]
    fn test_quarter_turn_moves_bottom_to_right() {
        // CCW quarter turn: content below center ends up right of center.
        let mut frame = Frame::black(21, 21, 0);
        frame.set_pixel(10, 16, [255, 255, 255]); // below center
        let rotator = CpuRotator::new(TransformOptions::default());
        let out = rotator.transform(&frame, 90.0);

        let mut brightest = (0u32, 0u32, 0u8);
        for y in 0..21 {
            for x in 0..21 {
                let v = out.pixel(x, y)[0];
                if v > brightest.2 {
                    brightest = (x, y, v);
                }
            }
        }
        let (bx, by, v) = brightest;
        assert!(v > 100);
        assert!(bx > 12, "expected right of center, got ({bx}, {by})");
        assert!((by as i32 - 10).abs() <= 2, "expected near vertical center");
    }

    #[test]
    fn test_paste_centered_offsets_floor() {
        let frame = gradient_frame(5, 4);
        let canvas = paste_centered(&frame, 8);
        // ox = (8-5)/2 = 1, oy = (8-4)/2 = 2
        assert_eq!(canvas.pixel(1, 2), frame.pixel(0, 0));
        assert_eq!(canvas.pixel(5, 5), frame.pixel(4, 3));
        assert_eq!(canvas.pixel(0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_ring_only_in_square_mode_composites_background() {
        let frame = Frame::black(64, 36, 0);
        let rotator = CpuRotator::new(TransformOptions {
            square: true,
            ring: Some(RingOptions::default()),
        });
        let out = rotator.transform(&frame, 0.0);
        // Source is all black, so the ring must show through.
        let ring_pixels = out
            .data()
            .chunks_exact(3)
            .filter(|px| px[0] == 128 && px[1] == 128 && px[2] == 128)
            .count();
        assert!(ring_pixels > 0);
    }
}
