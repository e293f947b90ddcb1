//! Glow visualization math
//!
//! Pure functions that turn the analyzer's byte-valued frequency bins into
//! the geometry of the avatar glow. Sampled once per UI frame; holds no state,
//! so a stopped source (whose analysis has been reset) immediately renders as
//! no glow.

use crate::config::visual::{
    AVATAR_RADIUS, GLOW_ALPHA_GAIN, GLOW_BASE_RADIUS, GLOW_RADIUS_GAIN, INTENSITY_GATE,
    NOISE_FLOOR, RING_ALPHA_GAIN, RING_RADIUS_GAIN,
};

/// Normalized glow intensity for one frame.
///
/// Mean bin magnitude with a noise-floor subtraction, scaled to roughly
/// [0, 1]: `max(0, mean - 10) / 255`.
pub fn intensity(bins: &[f32]) -> f32 {
    if bins.is_empty() {
        return 0.0;
    }
    let mean = bins.iter().sum::<f32>() / bins.len() as f32;
    (mean - NOISE_FLOOR).max(0.0) / 255.0
}

/// Geometry of the glow for one rendered frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowFrame {
    pub intensity: f32,
    /// Outer radius of the radial glow
    pub glow_radius: f32,
    /// Radius of the thin energy ring
    pub ring_radius: f32,
    /// Opacity of the glow's mid gradient stop
    pub glow_alpha: f32,
    /// Stroke opacity of the energy ring
    pub ring_alpha: f32,
}

impl GlowFrame {
    /// Build the glow for the given intensity, or `None` below the render
    /// gate (the frame draws nothing; the canvas was already cleared).
    pub fn from_intensity(intensity: f32) -> Option<Self> {
        if intensity <= INTENSITY_GATE {
            return None;
        }
        Some(Self {
            intensity,
            glow_radius: GLOW_BASE_RADIUS + intensity * GLOW_RADIUS_GAIN,
            ring_radius: AVATAR_RADIUS + intensity * RING_RADIUS_GAIN,
            glow_alpha: intensity * GLOW_ALPHA_GAIN,
            ring_alpha: intensity * RING_ALPHA_GAIN,
        })
    }

    /// Sample the glow directly from analyzer bins
    pub fn from_bins(bins: &[f32]) -> Option<Self> {
        Self::from_intensity(intensity(bins))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::audio::SPECTRUM_BINS;

    // --- intensity ---

    #[test]
    fn intensity_of_silence_is_zero() {
        assert_eq!(intensity(&[0.0; SPECTRUM_BINS]), 0.0);
    }

    #[test]
    fn intensity_of_empty_bins_is_zero() {
        assert_eq!(intensity(&[]), 0.0);
    }

    #[test]
    fn intensity_below_noise_floor_is_zero() {
        // Mean of 10 sits exactly at the floor
        assert_eq!(intensity(&[10.0; SPECTRUM_BINS]), 0.0);
        assert_eq!(intensity(&[5.0; SPECTRUM_BINS]), 0.0);
    }

    #[test]
    fn intensity_formula() {
        // mean 137.5 -> (137.5 - 10) / 255 = 0.5
        assert!((intensity(&[137.5; SPECTRUM_BINS]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn intensity_at_full_scale() {
        let i = intensity(&[255.0; SPECTRUM_BINS]);
        assert!((i - (255.0 - 10.0) / 255.0).abs() < 1e-6);
        assert!(i < 1.0);
    }

    #[test]
    fn intensity_uses_mean_not_peak() {
        // One hot bin among 128 barely moves the mean
        let mut bins = [0.0; SPECTRUM_BINS];
        bins[0] = 255.0;
        assert!(intensity(&bins) < 0.01);
    }

    // --- GlowFrame ---

    #[test]
    fn no_glow_at_or_below_gate() {
        assert!(GlowFrame::from_intensity(0.0).is_none());
        assert!(GlowFrame::from_intensity(0.05).is_none());
    }

    #[test]
    fn glow_just_above_gate() {
        assert!(GlowFrame::from_intensity(0.051).is_some());
    }

    #[test]
    fn glow_geometry_at_half_intensity() {
        let frame = GlowFrame::from_intensity(0.5).unwrap();
        assert!((frame.glow_radius - 74.0).abs() < 1e-5); // 64 + 0.5 * 20
        assert!((frame.ring_radius - 62.5).abs() < 1e-5); // 60 + 0.5 * 5
        assert!((frame.ring_alpha - 0.4).abs() < 1e-5); // 0.5 * 0.8
        assert!((frame.glow_alpha - 0.3).abs() < 1e-5); // 0.5 * 0.6
    }

    #[test]
    fn glow_grows_with_intensity() {
        let low = GlowFrame::from_intensity(0.1).unwrap();
        let high = GlowFrame::from_intensity(0.9).unwrap();
        assert!(high.glow_radius > low.glow_radius);
        assert!(high.ring_radius > low.ring_radius);
        assert!(high.ring_alpha > low.ring_alpha);
    }

    #[test]
    fn ring_stays_outside_avatar() {
        for i in [0.06, 0.3, 0.7, 1.0] {
            let frame = GlowFrame::from_intensity(i).unwrap();
            assert!(frame.ring_radius >= 60.0);
            assert!(frame.glow_radius > frame.ring_radius);
        }
    }

    #[test]
    fn from_bins_matches_from_intensity() {
        let bins = [120.0; SPECTRUM_BINS];
        let via_bins = GlowFrame::from_bins(&bins).unwrap();
        let via_intensity = GlowFrame::from_intensity(intensity(&bins)).unwrap();
        assert_eq!(via_bins, via_intensity);
    }

    #[test]
    fn silence_renders_nothing() {
        assert!(GlowFrame::from_bins(&[0.0; SPECTRUM_BINS]).is_none());
    }
}
