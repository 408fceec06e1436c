use crate::rotation::domain::angle_decoder::{color_distance, AngleDecoder, CornerColors};

/// Fallback angle when the reference axis has zero length (uniform
/// corners, i.e. no signal). Soft default, never an error.
const OFFSET_DEGREE: f64 = 180.0;

/// Continuous distance-based decoder for the game's first encoding
/// generation ("v1" recordings).
///
/// The game sweeps a gradient between the top-left and top-right corners
/// and places the current phase color in the bottom-left corner; the
/// bottom-right corner disambiguates direction. The decode is an analog
/// read of anti-aliased pixel colors, so it is sensitive to the sampling
/// window and to codec color rounding.
pub struct AnalogDistanceDecoder;

impl AngleDecoder for AnalogDistanceDecoder {
    fn decode(&self, corners: &CornerColors) -> f64 {
        let left = corners.top_left;
        let center = corners.top_right;
        let right = corners.bottom_right;
        let sample = corners.bottom_left;

        let center_dist = color_distance(center, sample);
        let left_length = color_distance(left, center);
        let left_dist = color_distance(left, sample);
        let right_dist = color_distance(right, sample);

        let direction = if left_dist < right_dist { -1.0 } else { 1.0 };

        let angle = if left_length == 0.0 {
            OFFSET_DEGREE
        } else {
            (center_dist - left_length) / left_length * 180.0 * direction + OFFSET_DEGREE
        };

        // The gradient runs opposite to the physical rotation.
        -angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn corners(
        top_left: [f64; 3],
        top_right: [f64; 3],
        bottom_left: [f64; 3],
        bottom_right: [f64; 3],
    ) -> CornerColors {
        CornerColors {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    #[test]
    fn test_zero_reference_length_returns_minus_180() {
        // All corners equal: left == center, so the reference axis
        // degenerates and the decoder falls back to the offset.
        let c = corners([7.0; 3], [7.0; 3], [7.0; 3], [7.0; 3]);
        assert_relative_eq!(AnalogDistanceDecoder.decode(&c), -180.0);
    }

    #[test]
    fn test_zero_reference_ignores_other_corners() {
        let c = corners([0.0; 3], [0.0; 3], [91.0, 3.0, 44.0], [250.0; 3]);
        assert_relative_eq!(AnalogDistanceDecoder.decode(&c), -180.0);
    }

    #[test]
    fn test_sample_at_center_gives_minus_360() {
        // sample == center: centerDist = 0, leftDist = leftLength >
        // rightDist = 0 is false, so direction depends on distances.
        // leftDist = 255, rightDist = 0 => direction +1.
        // angle = (0 - 255)/255 * 180 + 180 = 0... with direction +1:
        // (0-255)/255*180*1 + 180 = 0, negated = -0.
        let c = corners([0.0; 3], [255.0, 0.0, 0.0], [255.0, 0.0, 0.0], [255.0, 0.0, 0.0]);
        assert_relative_eq!(AnalogDistanceDecoder.decode(&c), 0.0);
    }

    #[test]
    fn test_sample_at_left_gives_minus_180() {
        // sample == left: centerDist = leftLength, so the proportional
        // term vanishes and only the offset remains.
        let c = corners(
            [255.0, 0.0, 0.0],
            [0.0; 3],
            [255.0, 0.0, 0.0],
            [0.0; 3],
        );
        assert_relative_eq!(AnalogDistanceDecoder.decode(&c), -180.0);
    }

    #[test]
    fn test_direction_flips_sign_of_offset_term() {
        // Halfway sample, direction decided by which side is closer.
        let left = [200.0, 0.0, 0.0];
        let center = [0.0, 0.0, 0.0];
        let sample = [100.0, 0.0, 0.0];

        let toward_left = corners(left, center, sample, [255.0, 255.0, 255.0]);
        let toward_right = corners(left, center, sample, [100.0, 0.0, 0.0]);

        let a = AnalogDistanceDecoder.decode(&toward_left);
        let b = AnalogDistanceDecoder.decode(&toward_right);

        // centerDist=100, leftLength=200: term = (100-200)/200*180 = -90.
        // direction -1 (leftDist 100 < rightDist ~244): angle = 90+180=270.
        assert_relative_eq!(a, -270.0);
        // direction +1 (rightDist 0): angle = -90+180 = 90.
        assert_relative_eq!(b, -90.0);
    }
}
