//! Shared audio types
//!
//! Pure data types used across the audio subsystem.

use std::fmt;
use std::num::NonZero;
use std::sync::Arc;
use std::time::Duration;

use rodio::buffer::SamplesBuffer;

use crate::config::audio::SPECTRUM_BINS;

/// Current playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Stopped => write!(f, "Stopped"),
            PlaybackState::Playing => write!(f, "Playing"),
            PlaybackState::Paused => write!(f, "Paused"),
        }
    }
}

/// A decoded narration clip: f32 samples tagged with their format.
///
/// Samples live behind an `Arc` so the clip is cheap to clone — replaying the
/// same narration after a pause-at-end does not copy the waveform.
#[derive(Clone, PartialEq)]
pub struct PcmClip {
    pub samples: Arc<[f32]>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmClip {
    /// Number of sample frames in the clip
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// Playback duration of the clip
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate as f64)
    }

    /// Build a playable rodio source from the clip
    pub fn to_source(&self) -> SamplesBuffer {
        let channels = NonZero::new(self.channels).unwrap_or(NonZero::<u16>::MIN);
        let sample_rate = NonZero::new(self.sample_rate).unwrap_or(NonZero::<u32>::MIN);
        SamplesBuffer::new(channels, sample_rate, self.samples.to_vec())
    }
}

impl fmt::Debug for PcmClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcmClip")
            .field("frames", &self.frame_count())
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .finish()
    }
}

/// Commands sent to the audio engine
pub enum AudioCommand {
    /// Stop the current source (if any) and start playing the clip
    Play(PcmClip),
    /// Stop playback
    Stop,
    /// Pause playback
    Pause,
    /// Resume paused playback
    Resume,
    /// Set volume (0.0..=2.0)
    SetVolume(f32),
    /// Shut down the engine thread
    Shutdown,
}

impl fmt::Debug for AudioCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioCommand::Play(clip) => f.debug_tuple("Play").field(clip).finish(),
            AudioCommand::Stop => write!(f, "Stop"),
            AudioCommand::Pause => write!(f, "Pause"),
            AudioCommand::Resume => write!(f, "Resume"),
            AudioCommand::SetVolume(v) => write!(f, "SetVolume({})", v),
            AudioCommand::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// Events emitted by the audio engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEvent {
    /// Playback of a new clip started
    Playing,
    /// Playback was stopped explicitly
    Stopped,
    /// Playback paused
    Paused,
    /// Playback resumed
    Resumed,
    /// The current clip played out to its natural end
    Finished,
}

/// Frequency analysis data for the glow visualization
///
/// `bins` holds byte-valued (0.0..=255.0) frequency magnitudes, one per FFT
/// bin, matching what the visualizer samples each frame.
#[derive(Clone)]
pub struct AudioAnalysis {
    pub bins: [f32; SPECTRUM_BINS],
    pub sample_count: u64,
}

impl Default for AudioAnalysis {
    fn default() -> Self {
        Self {
            bins: [0.0; SPECTRUM_BINS],
            sample_count: 0,
        }
    }
}

impl AudioAnalysis {
    /// Reset all analysis values to zero
    pub fn reset(&mut self) {
        self.bins = [0.0; SPECTRUM_BINS];
        self.sample_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- PlaybackState ---

    #[test]
    fn playback_state_default_is_stopped() {
        assert_eq!(PlaybackState::default(), PlaybackState::Stopped);
    }

    #[test]
    fn playback_state_display() {
        assert_eq!(PlaybackState::Stopped.to_string(), "Stopped");
        assert_eq!(PlaybackState::Playing.to_string(), "Playing");
        assert_eq!(PlaybackState::Paused.to_string(), "Paused");
    }

    // --- PcmClip ---

    fn clip_from(samples: Vec<f32>) -> PcmClip {
        PcmClip {
            samples: samples.into(),
            sample_rate: 24_000,
            channels: 1,
        }
    }

    #[test]
    fn clip_frame_count_mono() {
        let clip = clip_from(vec![0.0; 480]);
        assert_eq!(clip.frame_count(), 480);
    }

    #[test]
    fn clip_frame_count_stereo() {
        let clip = PcmClip {
            samples: vec![0.0f32; 480].into(),
            sample_rate: 24_000,
            channels: 2,
        };
        assert_eq!(clip.frame_count(), 240);
    }

    #[test]
    fn clip_duration() {
        // 24000 frames at 24 kHz = exactly one second
        let clip = clip_from(vec![0.0; 24_000]);
        assert_eq!(clip.duration(), Duration::from_secs(1));
    }

    #[test]
    fn clip_duration_zero_rate_is_zero() {
        let clip = PcmClip {
            samples: vec![0.0f32; 100].into(),
            sample_rate: 0,
            channels: 1,
        };
        assert_eq!(clip.duration(), Duration::ZERO);
    }

    #[test]
    fn clip_clone_shares_samples() {
        let clip = clip_from(vec![0.25; 100]);
        let cloned = clip.clone();
        assert!(Arc::ptr_eq(&clip.samples, &cloned.samples));
        assert_eq!(clip, cloned);
    }

    #[test]
    fn clip_to_source_preserves_format() {
        use rodio::Source;
        let clip = clip_from(vec![0.5; 48]);
        let source = clip.to_source();
        assert_eq!(source.channels().get(), 1);
        assert_eq!(source.sample_rate().get(), 24_000);
        let collected: Vec<f32> = source.collect();
        assert_eq!(collected.len(), 48);
        assert!(collected.iter().all(|&s| (s - 0.5).abs() < f32::EPSILON));
    }

    #[test]
    fn clip_debug_is_compact() {
        let clip = clip_from(vec![0.0; 1000]);
        let debug = format!("{:?}", clip);
        assert!(debug.contains("frames: 1000"));
        assert!(debug.contains("24000"));
        // The waveform itself must not be dumped
        assert!(debug.len() < 100);
    }

    // --- AudioCommand / AudioEvent ---

    #[test]
    fn audio_command_debug() {
        assert_eq!(format!("{:?}", AudioCommand::Stop), "Stop");
        assert_eq!(format!("{:?}", AudioCommand::Pause), "Pause");
        assert_eq!(format!("{:?}", AudioCommand::Resume), "Resume");
        assert_eq!(format!("{:?}", AudioCommand::SetVolume(0.5)), "SetVolume(0.5)");
        assert_eq!(format!("{:?}", AudioCommand::Shutdown), "Shutdown");
        let play = AudioCommand::Play(clip_from(vec![0.0; 4]));
        assert!(format!("{:?}", play).contains("Play"));
    }

    #[test]
    fn audio_event_equality() {
        assert_eq!(AudioEvent::Finished, AudioEvent::Finished);
        assert_ne!(AudioEvent::Finished, AudioEvent::Stopped);
        assert_ne!(AudioEvent::Playing, AudioEvent::Resumed);
    }

    // --- AudioAnalysis ---

    #[test]
    fn audio_analysis_default_is_zero() {
        let analysis = AudioAnalysis::default();
        assert!(analysis.bins.iter().all(|&v| v == 0.0));
        assert_eq!(analysis.sample_count, 0);
    }

    #[test]
    fn audio_analysis_reset() {
        let mut analysis = AudioAnalysis {
            bins: [200.0; SPECTRUM_BINS],
            sample_count: 42,
        };
        analysis.reset();
        assert!(analysis.bins.iter().all(|&v| v == 0.0));
        assert_eq!(analysis.sample_count, 0);
    }

    #[test]
    fn audio_analysis_bin_count() {
        let analysis = AudioAnalysis::default();
        assert_eq!(analysis.bins.len(), SPECTRUM_BINS);
        assert_eq!(SPECTRUM_BINS, 128);
    }
}
