//! Configuration constants for the lectern engine

/// Audio-related configuration
pub mod audio {
    /// Sample rate of narration audio delivered by the speech service (Hz)
    pub const SAMPLE_RATE: u32 = 24_000;

    /// Channel count of narration audio (mono)
    pub const CHANNELS: u16 = 1;

    /// FFT window size for visualization
    pub const FFT_SIZE: usize = 256;

    /// Number of frequency bins exposed to the visualizer (FFT_SIZE / 2)
    pub const SPECTRUM_BINS: usize = FFT_SIZE / 2;

    /// Lower bound of the dB range mapped onto byte-valued bins
    pub const MIN_DECIBELS: f32 = -100.0;

    /// Upper bound of the dB range mapped onto byte-valued bins
    pub const MAX_DECIBELS: f32 = -30.0;

    /// Smoothing factor for linear magnitudes between FFT windows
    /// (0.0-1.0, higher = slower decay)
    pub const SMOOTHING: f32 = 0.8;
}

/// Glow visualization geometry
///
/// Radii are expressed in the square canvas coordinate space the avatar is
/// rendered in.
pub mod visual {
    /// Side length of the avatar canvas
    pub const CANVAS_SIZE: f32 = 200.0;

    /// Subtracted from the mean bin value before normalizing to intensity
    pub const NOISE_FLOOR: f32 = 10.0;

    /// Minimum intensity below which no glow is drawn
    pub const INTENSITY_GATE: f32 = 0.05;

    /// Radius of the avatar portrait itself
    pub const AVATAR_RADIUS: f32 = 60.0;

    /// Base radius of the outer glow
    pub const GLOW_BASE_RADIUS: f32 = 64.0;

    /// How far the outer glow expands at full intensity
    pub const GLOW_RADIUS_GAIN: f32 = 20.0;

    /// How far the energy ring expands at full intensity
    pub const RING_RADIUS_GAIN: f32 = 5.0;

    /// Ring stroke opacity at full intensity
    pub const RING_ALPHA_GAIN: f32 = 0.8;

    /// Glow mid-stop opacity at full intensity
    pub const GLOW_ALPHA_GAIN: f32 = 0.6;
}
